//! Built-in generators.

use keysmith_types::{KeysmithError, Result, ScriptContext, ScriptFactory};
use std::fmt;
use std::str::FromStr;

use super::template::render;

/// Built-in generator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// 48 random alphanumeric characters
    Alnum,
    /// 32 random bytes, base64 encoded
    Base64,
    /// 24 random bytes, hex encoded
    Hex,
    /// Six random words
    Passphrase,
    /// 3072-bit Diffie-Hellman parameters
    DhParams,
    /// Ed25519 SSH key; the public half lands next to the artifact as `.pub`
    SshEd25519,
}

impl Preset {
    /// All presets, in documentation order.
    pub const ALL: [Preset; 6] = [
        Preset::Alnum,
        Preset::Base64,
        Preset::Hex,
        Preset::Passphrase,
        Preset::DhParams,
        Preset::SshEd25519,
    ];

    fn template(&self) -> &'static str {
        match self {
            Preset::Alnum => "LC_ALL=C tr -dc 'A-Za-z0-9' </dev/urandom | head -c 48",
            Preset::Base64 => "openssl rand -base64 32",
            Preset::Hex => "openssl rand -hex 24",
            Preset::Passphrase => "xkcdpass --numwords=6 --delimiter=' '",
            Preset::DhParams => "openssl dhparam 3072 2>/dev/null",
            Preset::SshEd25519 => concat!(
                "tmp=$(mktemp -d) && trap 'rm -rf \"$tmp\"' EXIT && ",
                "ssh-keygen -q -t ed25519 -N '' -C {{name}} -f \"$tmp/key\" && ",
                "cp \"$tmp/key.pub\" {{file}}.pub && ",
                "cat \"$tmp/key\"",
            ),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Alnum => write!(f, "alnum"),
            Preset::Base64 => write!(f, "base64"),
            Preset::Hex => write!(f, "hex"),
            Preset::Passphrase => write!(f, "passphrase"),
            Preset::DhParams => write!(f, "dhparams"),
            Preset::SshEd25519 => write!(f, "ssh-ed25519"),
        }
    }
}

impl FromStr for Preset {
    type Err = KeysmithError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.to_string() == s.to_lowercase())
            .ok_or_else(|| {
                let known: Vec<String> = Preset::ALL.iter().map(|p| p.to_string()).collect();
                KeysmithError::Validation(format!(
                    "Unknown generator preset '{}' (known: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Generator backed by a [`Preset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetScript {
    preset: Preset,
}

impl PresetScript {
    /// Create from a preset.
    pub fn new(preset: Preset) -> Self {
        Self { preset }
    }
}

impl ScriptFactory for PresetScript {
    fn script(&self, ctx: &ScriptContext<'_>) -> Result<String> {
        render(self.preset.template(), ctx)
    }

    fn describe(&self) -> String {
        format!("preset {}", self.preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysmith_types::{SecretDecl, SecretName};
    use std::path::{Path, PathBuf};

    #[test]
    fn test_preset_names_roundtrip() {
        for preset in Preset::ALL {
            assert_eq!(preset.to_string().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("HEX".parse::<Preset>().unwrap(), Preset::Hex);
    }

    #[test]
    fn test_every_preset_renders() {
        let secret = SecretDecl {
            name: SecretName::new("host-key").unwrap(),
            file: PathBuf::from("k.age"),
            generator: None,
        };
        let ctx = ScriptContext {
            secret: &secret,
            file: Path::new("/repo/k.age"),
            dependencies: &[],
            decrypt: &[],
        };

        for preset in Preset::ALL {
            let script = PresetScript::new(preset).script(&ctx).unwrap();
            assert!(!script.contains("{{"), "{} left a placeholder", preset);
        }

        let ssh = PresetScript::new(Preset::SshEd25519).script(&ctx).unwrap();
        assert!(ssh.contains("-C host-key"));
        assert!(ssh.contains("cp \"$tmp/key.pub\" /repo/k.age.pub"));
    }
}
