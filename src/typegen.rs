use anyhow::{Context, Result};
use std::path::Path;

/// Name of the generated source file under `<output>/gen-types/`.
const ARTIFACT_FILE: &str = "snippet_name.rs";

/// Writes the generated type artifact: a single Rust source file declaring
/// the closed set of snippet names discovered anywhere under the root, in
/// first-discovery order.
pub async fn write(names: &[String], output_dir: &Path) -> Result<()> {
    let gen_dir = output_dir.join("gen-types");
    tokio::fs::create_dir_all(&gen_dir)
        .await
        .with_context(|| format!("Failed to create directory {}", gen_dir.display()))?;

    let artifact = gen_dir.join(ARTIFACT_FILE);
    tokio::fs::write(&artifact, render(names))
        .await
        .with_context(|| format!("Failed to write type artifact {}", artifact.display()))?;

    log::debug!("Wrote type artifact {}", artifact.display());
    Ok(())
}

/// Renders the generated enumeration source for the given names.
pub fn render(names: &[String]) -> String {
    let variants = variant_idents(names);

    let mut out = String::new();
    out.push_str("//! This file is auto-generated. Do not edit manually.\n");
    out.push_str("//! Generated from snippet tags in the source tree.\n\n");
    out.push_str("/// Closed set of snippet names discovered in the source tree.\n");
    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
    out.push_str("pub enum SnippetName {\n");
    for variant in &variants {
        out.push_str(&format!("    {},\n", variant));
    }
    out.push_str("}\n\n");

    out.push_str("impl SnippetName {\n");
    out.push_str("    pub const ALL: &'static [SnippetName] = &[\n");
    for variant in &variants {
        out.push_str(&format!("        SnippetName::{},\n", variant));
    }
    out.push_str("    ];\n\n");

    out.push_str("    pub fn as_str(&self) -> &'static str {\n");
    if variants.is_empty() {
        out.push_str("        match *self {}\n");
    } else {
        out.push_str("        match self {\n");
        for (variant, name) in variants.iter().zip(names) {
            out.push_str(&format!(
                "            SnippetName::{} => \"{}\",\n",
                variant, name
            ));
        }
        out.push_str("        }\n");
    }
    out.push_str("    }\n\n");

    out.push_str("    pub fn from_name(name: &str) -> Option<SnippetName> {\n");
    out.push_str("        Self::ALL.iter().copied().find(|s| s.as_str() == name)\n");
    out.push_str("    }\n");
    out.push_str("}\n");

    out
}

/// Derives unique UpperCamelCase variant identifiers from the snippet names.
fn variant_idents(names: &[String]) -> Vec<String> {
    let mut used = std::collections::HashSet::new();
    let mut idents = Vec::with_capacity(names.len());
    for name in names {
        let mut ident = variant_ident(name);
        let mut suffix = 2;
        while !used.insert(ident.clone()) {
            ident = format!("{}{}", variant_ident(name), suffix);
            suffix += 1;
        }
        idents.push(ident);
    }
    idents
}

fn variant_ident(name: &str) -> String {
    let mut ident = String::new();
    let mut capitalize = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if capitalize {
                ident.extend(c.to_uppercase());
                capitalize = false;
            } else {
                ident.push(c);
            }
        } else {
            // Separators (-, _, .) start a new word.
            capitalize = true;
        }
    }
    if ident.is_empty() {
        ident.push_str("Unnamed");
    }
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, 'N');
    }
    ident
}
