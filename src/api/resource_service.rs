use handlebars::Handlebars;
use hard_xml::XmlRead;
use serde::Serialize;
use crate::api::models::CocktailError;
use crate::api::models::resources_xml::ResourcesElement;

#[derive(Clone)]
pub struct ResourceService {
    resource_element: ResourcesElement
}

impl ResourceService {
    pub fn new(resource_element: ResourcesElement) -> ResourceService {
        ResourceService {
            resource_element
        }
    }

    pub fn from_xml_str(resource_xml_content: &str) -> Result<ResourceService, String> {
        ResourcesElement::from_str(resource_xml_content)
            .map(ResourceService::new)
            .map_err(|error| error.to_string())
    }

    pub fn get_resource_string_by_name(&self, name: &str) -> Option<String> {
        self.resource_element.strings
            .iter()
            .find(|string_element| string_element.name == name)
            .map(|string_element| string_element.content.clone())
    }

    pub fn render_resource_template_string_by_name<T: Serialize>(&self, name: &str, data: &T) -> Option<String> {
        // Messages are plain text, not HTML.
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        let template_string = self.get_resource_string_by_name(name)?;
        handlebars.render_template(template_string.as_str(), data).ok()
    }

    /// Log line from a template, or the template name when it's missing so
    /// a broken resource file never silences logging.
    pub fn render_log_message<T: Serialize>(&self, name: &str, data: &T) -> String {
        self.render_resource_template_string_by_name(name, data)
            .unwrap_or_else(|| name.to_string())
    }

    /// User-facing message for an error; falls back to its Display text.
    pub fn render_error_message(&self, error: &CocktailError) -> String {
        self.render_resource_template_string_by_name(error.resource_name(), &error.template_data())
            .unwrap_or_else(|| error.to_string())
    }
}
