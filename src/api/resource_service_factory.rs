use std::fs;
use crate::api::ResourceService;

pub struct ResourceServiceFactory {}

impl ResourceServiceFactory {
    pub fn create() -> Result<ResourceService, String> {
        let home_dir = dirs::home_dir().ok_or("Couldn't locate home directory")?;
        let strings_xml_file_path = dotenv::var("STRINGS_XML_FILE_PATH")
            .map_err(|error| format!("STRINGS_XML_FILE_PATH: {}", error))?;
        let file_path = home_dir.join(strings_xml_file_path);
        let resource_xml_content = fs::read_to_string(&file_path)
            .map_err(|error| format!("Couldn't read {}: {}", file_path.display(), error))?;
        ResourceService::from_xml_str(&resource_xml_content)
    }
}
