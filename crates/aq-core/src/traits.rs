//! Core identity traits

/// Primary key type used by the resource store
pub type Id = i64;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Option<Id>;
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

/// Trait for entities that belong to a project
pub trait ProjectScoped {
    fn project_id(&self) -> Option<Id>;
}
