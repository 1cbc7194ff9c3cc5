//! Default node types of a template
//!
//! Network editors place inflows, outflows and junctions without asking the
//! user for a type. A template names them either explicitly through
//! `layout.default_types` (type ids) or implicitly by type name.

use aq_core::config::TemplateDefaults;
use aq_models::{layout_id, Template, TemplateType};
use serde::{Deserialize, Serialize};

/// Type names used when the template layout does not say otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultTypeNames {
    pub inflow: String,
    pub outflow: String,
    pub junction: String,
}

impl Default for DefaultTypeNames {
    fn default() -> Self {
        Self {
            inflow: "Inflow".into(),
            outflow: "Outflow".into(),
            junction: "Junction".into(),
        }
    }
}

impl From<&TemplateDefaults> for DefaultTypeNames {
    fn from(config: &TemplateDefaults) -> Self {
        Self {
            inflow: config.inflow_type.clone(),
            outflow: config.outflow_type.clone(),
            junction: config.junction_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DefaultTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflow: Option<TemplateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outflow: Option<TemplateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction: Option<TemplateType>,
}

fn resolve(template: &Template, key: &str, default_name: &str) -> Option<TemplateType> {
    let configured = template
        .layout
        .get("default_types")
        .and_then(|defaults| defaults.get(key));

    match configured {
        // an explicit entry wins, even when it points nowhere
        Some(value) => layout_id(value).and_then(|id| template.find_type(id)).cloned(),
        None => template
            .templatetypes
            .iter()
            .find(|tt| tt.name == default_name)
            .cloned(),
    }
}

pub fn default_types(template: &Template, names: &DefaultTypeNames) -> DefaultTypes {
    DefaultTypes {
        inflow: resolve(template, "inflow", &names.inflow),
        outflow: resolve(template, "outflow", &names.outflow),
        junction: resolve(template, "junction", &names.junction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_models::ResourceKind;
    use serde_json::json;

    fn template() -> Template {
        let mut template = Template::new("WaterLP");
        for (id, name) in [(1, "Inflow"), (2, "Outflow"), (3, "Junction"), (4, "Catchment")] {
            let mut tt = TemplateType::new(name, ResourceKind::Node);
            tt.id = Some(id);
            template.templatetypes.push(tt);
        }
        template
    }

    #[test]
    fn test_defaults_by_name() {
        let defaults = default_types(&template(), &DefaultTypeNames::default());
        assert_eq!(defaults.inflow.and_then(|tt| tt.id), Some(1));
        assert_eq!(defaults.outflow.and_then(|tt| tt.id), Some(2));
        assert_eq!(defaults.junction.and_then(|tt| tt.id), Some(3));
    }

    #[test]
    fn test_layout_overrides_names() {
        let mut template = template();
        template.layout.insert(
            "default_types".into(),
            json!({"inflow": "4", "junction": 99}),
        );

        let defaults = default_types(&template, &DefaultTypeNames::default());
        assert_eq!(defaults.inflow.map(|tt| tt.name), Some("Catchment".to_string()));
        assert_eq!(defaults.outflow.and_then(|tt| tt.id), Some(2));
        assert!(defaults.junction.is_none());
    }

    #[test]
    fn test_custom_names() {
        let names = DefaultTypeNames {
            inflow: "Catchment".into(),
            ..Default::default()
        };
        let defaults = default_types(&template(), &names);
        assert_eq!(defaults.inflow.and_then(|tt| tt.id), Some(4));
    }

    #[test]
    fn test_names_from_config() {
        let config = TemplateDefaults {
            junction_type: "Catchment".into(),
            ..Default::default()
        };
        let defaults = default_types(&template(), &DefaultTypeNames::from(&config));
        assert_eq!(defaults.inflow.and_then(|tt| tt.id), Some(1));
        assert_eq!(defaults.junction.and_then(|tt| tt.id), Some(4));
    }
}
