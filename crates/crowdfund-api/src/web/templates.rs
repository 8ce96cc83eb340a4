use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use minijinja::Environment;
use serde::Serialize;
use tracing::{debug, info};

const LAYOUT_DIR: &str = "layouts";

/// Page renderer built once at startup.
///
/// Every file under `layouts/` is registered as `layouts/<file>`. Every file
/// in any other direct subdirectory is registered as `<dir>/<file>` and also
/// as a page named `<file>` that extends the first layout (in file name
/// order) and renders the include into its `content` block.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut env = Environment::new();

        let layouts = files_in(&dir.join(LAYOUT_DIR))
            .with_context(|| format!("reading layouts in {}", dir.display()))?;
        let Some(skeleton) = layouts.first() else {
            bail!("no layouts found in {}", dir.join(LAYOUT_DIR).display());
        };
        let skeleton = format!("{}/{}", LAYOUT_DIR, file_name(skeleton)?);

        for path in &layouts {
            register(&mut env, format!("{}/{}", LAYOUT_DIR, file_name(path)?), path)?;
        }

        let mut groups: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("reading {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir() && p.file_name().is_some_and(|n| n != LAYOUT_DIR))
            .collect();
        groups.sort();

        let mut pages = 0;
        for group in groups {
            let group_name = file_name(&group)?;
            for path in files_in(&group)? {
                let name = file_name(&path)?;
                let include = format!("{}/{}", group_name, name);
                register(&mut env, include.clone(), &path)?;

                let composed = format!(
                    "{{% extends \"{}\" %}}{{% block content %}}{{% include \"{}\" %}}{{% endblock %}}",
                    skeleton, include
                );
                env.add_template_owned(name.clone(), composed)
                    .with_context(|| format!("composing page {}", name))?;
                debug!("Registered page {} from {}", name, include);
                pages += 1;
            }
        }

        info!("Loaded {} layouts and {} pages from {}", layouts.len(), pages, dir.display());
        Ok(Self { env })
    }

    pub fn render<C: Serialize>(&self, name: &str, ctx: C) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("unknown template {}", name))?;
        template
            .render(ctx)
            .with_context(|| format!("rendering {}", name))
    }
}

fn register(env: &mut Environment<'static>, name: String, path: &Path) -> Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading template {}", path.display()))?;
    env.add_template_owned(name.clone(), source)
        .with_context(|| format!("parsing template {}", name))
}

/// Regular files directly inside `dir`, sorted by name.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("unusable file name {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn pages_render_inside_first_layout() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "layouts/a_layout.html", "<main>{% block content %}{% endblock %}</main>");
        write(dir.path(), "layouts/b_nav.html", "<nav>{{ title }}</nav>");
        write(
            dir.path(),
            "user/user_index.html",
            "{% include \"layouts/b_nav.html\" %}{% for u in users %}<p>{{ u }}</p>{% endfor %}",
        );

        let templates = Templates::load(dir.path()).unwrap();
        let html = templates
            .render(
                "user_index.html",
                serde_json::json!({ "title": "Users", "users": ["<ann>", "bob"] }),
            )
            .unwrap();
        assert_eq!(html, "<main><nav>Users</nav><p>&lt;ann&gt;</p><p>bob</p></main>");
    }

    #[test]
    fn missing_or_empty_layouts_abort() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user/user_index.html", "x");
        assert!(Templates::load(dir.path()).is_err());

        fs::create_dir_all(dir.path().join("layouts")).unwrap();
        assert!(Templates::load(dir.path()).is_err());
    }

    #[test]
    fn broken_template_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "layouts/layout.html", "{% block content %}{% endblock %}");
        write(dir.path(), "user/bad.html", "{% for x in %}");
        assert!(Templates::load(dir.path()).is_err());
    }

    #[test]
    fn unknown_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "layouts/layout.html", "{% block content %}{% endblock %}");
        let templates = Templates::load(dir.path()).unwrap();
        assert!(templates.render("nope.html", ()).is_err());
    }
}
