//! Named query templates and placeholder substitution.
//!
//! A template is a GraphQL document with `{name}` placeholders. Lines starting with
//! [`COMMENT_MARKER`] are dropped before anything else happens. Substitution is a single
//! pass over the comment-free text: values are spliced in verbatim and never rescanned, and
//! placeholders nobody bound are left exactly as written.

use std::{fmt, io};

use camino::{Utf8Path, Utf8PathBuf};
use regex::{Captures, Regex};

/// Lines beginning with this character never reach the backend
pub const COMMENT_MARKER: char = '#';

/// File extension of template files in a template directory
pub const TEMPLATE_EXTENSION: &str = "gql";

const EMBEDDED: &[(&str, &str)] = &[
    ("traces", include_str!("../templates/traces.gql")),
    ("services", include_str!("../templates/services.gql")),
    ("instances", include_str!("../templates/instances.gql")),
    ("endpoints", include_str!("../templates/endpoints.gql")),
    ("topo", include_str!("../templates/topo.gql")),
    ("instanceTopo", include_str!("../templates/instanceTopo.gql")),
    ("metrics", include_str!("../templates/metrics.gql")),
    (
        "metrics-multiLines",
        include_str!("../templates/metrics-multiLines.gql"),
    ),
    ("read-metrics", include_str!("../templates/read-metrics.gql")),
    (
        "read-labeled-metrics",
        include_str!("../templates/read-labeled-metrics.gql"),
    ),
];

/// Errors raised while turning a template name into a request body
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    /// No template is known under this name
    #[error("no query template named \"{name}\"")]
    NotFound {
        /// The requested template name
        name: String,
    },
    /// A template file exists but could not be read
    #[error("could not read query template \"{name}\" from {path}")]
    Read {
        /// The requested template name
        name: String,
        /// The file that failed to load
        path: Utf8PathBuf,
        /// The underlying I/O failure
        source: io::Error,
    },
    /// The placeholder names could not be compiled into a pattern
    #[error("could not build the placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Where template text is loaded from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The templates compiled into this crate
    #[default]
    Embedded,
    /// `<dir>/<name>.gql` files. A name without a file in the directory falls back to the
    /// embedded template of the same name.
    Directory(Utf8PathBuf),
}

impl TemplateSource {
    /// Loads the raw text of the template `name`, comments included
    pub fn load(&self, name: &str) -> Result<String, TemplateError> {
        if let TemplateSource::Directory(dir) = self {
            if let Some(text) = read_template_file(dir, name)? {
                return Ok(text);
            }
        }
        embedded(name)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })
    }
}

fn read_template_file(dir: &Utf8Path, name: &str) -> Result<Option<String>, TemplateError> {
    let path = dir.join(format!("{name}.{TEMPLATE_EXTENSION}"));
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            tracing::debug!(%path, "loaded query template from disk");
            Ok(Some(text))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TemplateError::Read {
            name: name.to_string(),
            path,
            source,
        }),
    }
}

/// The compiled-in template called `name`, if there is one
pub fn embedded(name: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(embedded_name, _)| *embedded_name == name)
        .map(|(_, text)| *text)
}

/// Names of every compiled-in template
pub fn embedded_names() -> impl Iterator<Item = &'static str> {
    EMBEDDED.iter().map(|(name, _)| *name)
}

/// Named substitution values for one query.
///
/// Binding the same name twice replaces the earlier value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    values: Vec<(&'static str, String)>,
}

impl Bindings {
    /// An empty set of bindings
    pub const fn new() -> Bindings {
        Bindings { values: Vec::new() }
    }

    /// Builder-style [`Bindings::insert`]
    pub fn bind(mut self, name: &'static str, value: impl fmt::Display) -> Bindings {
        self.insert(name, value);
        self
    }

    /// Binds `{name}` to the display form of `value`
    pub fn insert(&mut self, name: &'static str, value: impl fmt::Display) {
        let value = value.to_string();
        match self.values.iter_mut().find(|(bound, _)| *bound == name) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((name, value)),
        }
    }

    /// The value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value.as_str())
    }

    /// Bound names, in binding order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }

    /// Whether nothing has been bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound names ordered longest first, so that no name can shadow a longer one it prefixes
    fn names_longest_first(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.names().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names
    }
}

/// A literal query document, every bound placeholder already substituted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody(String);

impl RequestBody {
    /// The document text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the body, yielding the document text
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Drops comment lines and joins what is left with newlines
pub fn strip_comments(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces every `{name}` bound in `bindings` with its value in one pass over `text`
pub fn substitute(text: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    if bindings.is_empty() {
        return Ok(text.to_string());
    }
    let alternatives = bindings
        .names_longest_first()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&format!(r"\{{({alternatives})\}}"))?;
    let substituted = pattern.replace_all(text, |caps: &Captures<'_>| {
        bindings
            .get(&caps[1])
            .map_or_else(|| caps[0].to_string(), str::to_string)
    });
    Ok(substituted.into_owned())
}

/// Loads templates and binds parameters into them
#[derive(Clone, Debug, Default)]
pub struct TemplateResolver {
    source: TemplateSource,
}

impl TemplateResolver {
    /// Resolves templates from `source`
    pub const fn new(source: TemplateSource) -> TemplateResolver {
        TemplateResolver { source }
    }

    /// Where this resolver reads templates from
    pub const fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Loads the template `name`, strips its comments and substitutes `bindings` into it.
    ///
    /// The template is read afresh on every call.
    pub fn resolve(&self, name: &str, bindings: &Bindings) -> Result<RequestBody, TemplateError> {
        let raw = self.source.load(name)?;
        let body = substitute(&strip_comments(&raw), bindings)?;
        tracing::debug!(template = name, query = %body, "resolved query template");
        Ok(RequestBody(body))
    }
}
