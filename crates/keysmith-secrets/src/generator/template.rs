//! Script templates with `{{ placeholder }}` substitution.

use keysmith_types::{KeysmithError, ResolvedDependency, Result, ScriptContext, ScriptFactory};
use once_cell::sync::Lazy;
use regex::Regex;

use super::shell_quote;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Generator defined by a user-supplied script template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateScript {
    source: String,
}

impl TemplateScript {
    /// Create from template source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl ScriptFactory for TemplateScript {
    fn script(&self, ctx: &ScriptContext<'_>) -> Result<String> {
        render(&self.source, ctx)
    }

    fn describe(&self) -> String {
        "script".to_string()
    }
}

/// Render `template`, substituting each placeholder shell-quoted.
///
/// Supported keys: `name`, `file`, `decrypt`, and
/// `deps.<index|name>.<host|name|file>`.
pub fn render(template: &str, ctx: &ScriptContext<'_>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&lookup(key.as_str(), ctx)?);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

fn lookup(key: &str, ctx: &ScriptContext<'_>) -> Result<String> {
    let value = match key.split('.').collect::<Vec<_>>().as_slice() {
        ["name"] => shell_quote(ctx.secret.name.as_str()),
        ["file"] => shell_quote(&ctx.file.to_string_lossy()),
        ["decrypt"] => ctx
            .decrypt
            .iter()
            .map(|word| shell_quote(word))
            .collect::<Vec<_>>()
            .join(" "),
        ["deps", selector, field] => {
            let dep = find_dependency(selector, ctx)?;
            match *field {
                "host" => shell_quote(dep.host.as_str()),
                "name" => shell_quote(dep.name.as_str()),
                "file" => shell_quote(&dep.file.to_string_lossy()),
                other => return Err(unknown(key, ctx, &format!("no dependency field '{}'", other))),
            }
        }
        _ => return Err(unknown(key, ctx, "unknown placeholder")),
    };
    Ok(value)
}

fn find_dependency<'a>(selector: &str, ctx: &ScriptContext<'a>) -> Result<&'a ResolvedDependency> {
    let found = match selector.parse::<usize>() {
        Ok(index) => ctx.dependencies.get(index),
        Err(_) => ctx.dependencies.iter().find(|d| d.name.as_str() == selector),
    };

    found.ok_or_else(|| {
        KeysmithError::Validation(format!(
            "generator for {} references dependency '{}' but declares {} dependencies",
            ctx.secret.name,
            selector,
            ctx.dependencies.len()
        ))
    })
}

fn unknown(key: &str, ctx: &ScriptContext<'_>, why: &str) -> KeysmithError {
    KeysmithError::Validation(format!(
        "generator for {}: {} in {{{{{}}}}}",
        ctx.secret.name, why, key
    ))
}
