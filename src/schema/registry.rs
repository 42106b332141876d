//! Embedded JSON Schema registry

use rust_embed::RustEmbed;

use crate::core::identity::EntityPrefix;

/// JSON Schemas compiled into the binary
#[derive(RustEmbed)]
#[folder = "schemas/"]
#[include = "*.schema.json"]
struct EmbeddedSchemas;

/// Lookup of entity schemas by prefix
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// File name for an entity type's schema
    fn schema_file(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Item => "item.schema.json",
            EntityPrefix::Asm => "assembly.schema.json",
            EntityPrefix::Vnd => "vendor.schema.json",
            EntityPrefix::Ctr => "contract.schema.json",
            EntityPrefix::Chg => "change.schema.json",
            EntityPrefix::Spec => "spec.schema.json",
            EntityPrefix::Map => "mapping.schema.json",
            EntityPrefix::Task => "task.schema.json",
        }
    }

    /// Get the schema source for an entity type
    pub fn get(prefix: EntityPrefix) -> Option<String> {
        let file = EmbeddedSchemas::get(Self::schema_file(prefix))?;
        String::from_utf8(file.data.into_owned()).ok()
    }
}
