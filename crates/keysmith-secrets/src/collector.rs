//! Collects the generated secrets declared across all hosts.

use keysmith_types::{Definition, GeneratorDecl, HostDecl, HostName, SecretDecl};

/// A secret declaration that carries a generator, with its declaring host.
#[derive(Debug, Clone, Copy)]
pub struct Collected<'a> {
    /// Declaring host
    pub host: &'a HostName,
    /// The declaration
    pub secret: &'a SecretDecl,
    /// Its generator
    pub generator: &'a GeneratorDecl,
}

impl Collected<'_> {
    /// The `host:secret` pair of this declaration.
    pub fn definition(&self) -> Definition {
        Definition {
            host: self.host.clone(),
            secret: self.secret.name.clone(),
        }
    }
}

/// Every `(host, secret)` pair whose secret has a generator.
///
/// Pairs come in host enumeration order, then secret declaration order.
/// Hosts without generated secrets contribute nothing.
pub fn collect(hosts: &[HostDecl]) -> Vec<Collected<'_>> {
    hosts
        .iter()
        .flat_map(|host| {
            host.secrets.iter().filter_map(move |secret| {
                secret.generator.as_ref().map(|generator| Collected {
                    host: &host.name,
                    secret,
                    generator,
                })
            })
        })
        .collect()
}
