//! Generator script factories.
//!
//! A generator declaration becomes a [`ScriptFactory`] that renders the
//! shell script producing the secret's plaintext on stdout.

pub mod template;
pub mod presets;

pub use template::TemplateScript;
pub use presets::{Preset, PresetScript};

use keysmith_types::{GeneratorDecl, KeysmithError, Result, ScriptFactory};

/// Factory function to create a script factory from a generator declaration.
pub fn create_factory(decl: &GeneratorDecl) -> Result<Box<dyn ScriptFactory>> {
    match (&decl.script, &decl.preset) {
        (Some(script), None) => Ok(Box::new(TemplateScript::new(script.clone()))),
        (None, Some(preset)) => Ok(Box::new(PresetScript::new(preset.parse()?))),
        (Some(_), Some(_)) => Err(KeysmithError::Validation(
            "generator must set either 'script' or 'preset', not both".to_string(),
        )),
        (None, None) => Err(KeysmithError::Validation(
            "generator must set 'script' or 'preset'".to_string(),
        )),
    }
}

/// Quote `word` for a POSIX shell.
///
/// Words made only of characters the shell never interprets are returned
/// unchanged; anything else is single-quoted.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
