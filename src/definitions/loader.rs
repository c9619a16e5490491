//! Tag definition loading
//!
//! Walks a definition root and turns every `*.tag` file into a
//! [`TagDefinition`] named after its path relative to the root.

use std::path::Path;

use anyhow::{Context, Result};

use crate::definitions::parser::parse_tag_file;
use crate::definitions::schema::TagDefinition;
use crate::fileutil::{list_matching_files, read_formatted};

/// Extension of component definition files
pub const TAG_FILE_EXTENSION: &str = "tag";

/// Load all tag definitions under `directory`, in walk order
pub fn load_all_tags(directory: &Path, encoding: &str) -> Result<Vec<TagDefinition>> {
    let files = list_matching_files(directory, |path| {
        path.extension().and_then(|ext| ext.to_str()) == Some(TAG_FILE_EXTENSION)
    })
    .with_context(|| format!("Failed to list tag files: {}", directory.display()))?;

    let mut definitions = Vec::with_capacity(files.len());
    for file in files {
        let name = tag_name_from_path(directory, &file)?;
        let body = read_formatted(&file, encoding)?;
        let attributes = parse_tag_file(&body);
        log::debug!(
            "Loaded tag definition '{}' with {} attribute(s) from {}",
            name,
            attributes.len(),
            file.display()
        );
        definitions.push(TagDefinition { name, attributes });
    }

    log::info!(
        "Loaded {} tag definition(s) from {}",
        definitions.len(),
        directory.display()
    );
    Ok(definitions)
}

/// `root/field/text.tag` becomes `field:text`
pub fn tag_name_from_path(root: &Path, file: &Path) -> Result<String> {
    let relative = file.strip_prefix(root).with_context(|| {
        format!(
            "Tag file {} is not under {}",
            file.display(),
            root.display()
        )
    })?;

    let components: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(components.join(":"))
}
