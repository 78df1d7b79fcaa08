//! Vanity import page rendering.
//!
//! A [`PageRenderer`] owns the parsed page template. It is built once at
//! startup and then only read, so a malformed template surfaces before any
//! repository is touched.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context as TeraCxt, Tera};
use thiserror::Error;
use tracing::{debug, error, info};

/// File written into every import path directory.
pub const PAGE_FILE_NAME: &str = "index.html";

/// Version control system announced in `go-import`. Every repository is
/// assumed to be a git repository.
pub const VCS_KIND: &str = "git";

const TEMPLATE_NAME: &str = "package.html";

const PACKAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
  <meta name="go-import" content="{{ module }} {{ vcs }} {{ source }}"/>
  <meta name="go-source" content="{{ module }} {{ source }} {{ source }}/tree/master{/dir} {{ source }}/blob/master{/dir}/{file}#L{line}"/>
</head>
<body>
  <h1>{{ import_path }}</h1>
  <p>{{ description }}</p>
  <p><a href="https://pkg.go.dev/{{ import_path }}/">See the package documentation.</a></p>
</body>
</html>
"#;

/// A single importable package, as published on its vanity page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Repository URL.
    pub source: String,
    /// Module path the repository declares.
    pub module: String,
    /// Equal to `module` for the root package.
    pub import_path: String,
    /// May be empty.
    pub description: String,
}

impl Package {
    /// The root package of `module`, served from `source`.
    pub fn module_root(source: impl Into<String>, module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            source: source.into(),
            import_path: module.clone(),
            module,
            description: String::new(),
        }
    }

    /// A package of the same module at `import_path`.
    pub fn sub_package(&self, import_path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            source: self.source.clone(),
            module: self.module.clone(),
            import_path: import_path.into(),
            description: description.into(),
        }
    }

    /// Whether `import_path` is `module` itself or nested below it.
    pub fn is_within_module(&self) -> bool {
        match self.import_path.strip_prefix(&self.module) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid page template: {0}")]
    Template(#[source] tera::Error),
    #[error("failed to render page for {import_path}: {source}")]
    Render {
        import_path: String,
        #[source]
        source: tera::Error,
    },
    #[error("import path {import_path:?} is not a valid path under module {module:?}")]
    InvalidImportPath { import_path: String, module: String },
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders [`Package`] values into `index.html` files.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, PACKAGE_TEMPLATE)
            .map_err(RenderError::Template)?;
        // Tera's default escaper also rewrites `/`, which would mangle URLs.
        tera.set_escape_fn(escape_html);

        Ok(Self { tera })
    }

    /// Renders the page for `package` without touching the filesystem.
    pub fn render(&self, package: &Package) -> Result<String, RenderError> {
        let render_err = |e: tera::Error| RenderError::Render {
            import_path: package.import_path.clone(),
            source: e,
        };

        let mut context = TeraCxt::from_serialize(package).map_err(render_err)?;
        context.insert("vcs", VCS_KIND);

        self.tera.render(TEMPLATE_NAME, &context).map_err(render_err)
    }

    /// Renders `package` to `<output>/<import path>/index.html`, creating
    /// directories as needed and overwriting any existing page.
    pub async fn write_page(&self, output: &Path, package: &Package) -> Result<PathBuf, RenderError> {
        let dest = page_path(output, package)?;
        let body = self.render(package)?;

        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                error!(error = ?e, path = %dir.display(), "Failed to create page directory");
                RenderError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                }
            })?;
        }

        tokio::fs::write(&dest, body).await.map_err(|e| {
            error!(error = ?e, path = %dest.display(), "Failed to write page");
            RenderError::Io {
                path: dest.clone(),
                source: e,
            }
        })?;

        info!(import_path = %package.import_path, path = %dest.display(), "Wrote package page");
        Ok(dest)
    }
}

/// `<output>/<import path segments>/index.html`.
///
/// Rejects import paths outside the package's module and paths with empty,
/// `.` or `..` segments, so a page can never land outside `output`.
pub fn page_path(output: &Path, package: &Package) -> Result<PathBuf, RenderError> {
    let invalid = || RenderError::InvalidImportPath {
        import_path: package.import_path.clone(),
        module: package.module.clone(),
    };

    if !package.is_within_module() {
        return Err(invalid());
    }

    let mut dest = output.to_path_buf();
    for segment in package.import_path.split('/') {
        if matches!(segment, "" | "." | "..") || segment.contains('\\') {
            return Err(invalid());
        }
        dest.push(segment);
    }
    dest.push(PAGE_FILE_NAME);

    debug!(import_path = %package.import_path, path = %dest.display(), "Resolved page path");
    Ok(dest)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
