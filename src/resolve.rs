//! Core resolution pipeline: merge all layers into one config, or into an
//! explanation of where each value came from.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no discovery or parsing,
//! so the whole pipeline is testable with synthetic fragments. Steps:
//!
//! 1. Template each fragment (defaults, every file, env, flags)
//! 2. Deep-merge them in ascending precedence: defaults, files in discovery
//!    order, env, flags
//! 3. Template the merged result again
//!
//! [`explain`] runs the same steps, tagging each fragment's leaves with their
//! source before the merge.

use std::path::Path;

use crate::error::RcfigError;
use crate::explain::{self, Explanation};
use crate::file::ConfigFile;
use crate::merge::merge_all;
use crate::template::Templater;
use crate::types::Source;
use crate::value::Mapping;

/// All pre-loaded data needed to resolve a config.
pub struct ResolveInput<'a> {
    pub defaults: Mapping,
    /// Files in discovery order: first = lowest priority, last = highest.
    pub files: Vec<ConfigFile>,
    pub env: Mapping,
    pub flags: Mapping,
    pub templater: Templater<'a>,
    /// Base for the relative file labels in explanations.
    pub cwd: &'a Path,
}

impl ResolveInput<'_> {
    /// Every fragment with its source, templated, lowest precedence first.
    fn into_fragments(self) -> Result<Vec<(Source, Mapping)>, RcfigError> {
        let mut fragments = Vec::with_capacity(self.files.len() + 3);
        fragments.push((Source::Defaults, self.defaults));
        for file in self.files {
            fragments.push((Source::File(file.path.label(self.cwd)), file.data));
        }
        fragments.push((Source::Environment, self.env));
        fragments.push((Source::Flag, self.flags));

        for (_, fragment) in &mut fragments {
            self.templater.apply_mapping(fragment)?;
        }
        Ok(fragments)
    }
}

/// Resolve the final configuration.
pub fn resolve(input: ResolveInput<'_>) -> Result<Mapping, RcfigError> {
    let templater = input.templater;
    let fragments = input.into_fragments()?;

    let mut merged = merge_all(fragments.into_iter().map(|(_, fragment)| fragment));
    templater.apply_mapping(&mut merged)?;
    Ok(merged)
}

/// Resolve the configuration with every leaf tagged by its winning source.
pub fn explain(input: ResolveInput<'_>) -> Result<Explanation, RcfigError> {
    let templater = input.templater;
    let fragments = input.into_fragments()?;

    let mut merged = merge_all(
        fragments
            .into_iter()
            .map(|(source, fragment)| explain::tag(fragment, &source)),
    );
    explain::apply_templates(&mut merged, &templater)?;
    Ok(merged)
}
