//! # Keysmith Inventory
//!
//! Loads the hosts of a keysmith repository and the secrets each declares.
//!
//! Every `<hosts_dir>/<host>.yml` file describes one host:
//!
//! ```yaml
//! secrets:
//!   root-key:
//!     file: secrets/shared/root.age
//!     generator:
//!       preset: hex
//!   api-token:
//!     file: secrets/web/api-token.age
//!     generator:
//!       script: printf '%s-api' "$({{decrypt}} {{deps.0.file}})"
//!       dependencies:
//!         - secret: root-key
//!           file: secrets/shared/root.age
//!   tls-cert:
//!     file: secrets/web/tls.age
//! ```
//!
//! Hosts are enumerated in file-name order and secrets in file order; the
//! engine relies on both orders for deterministic output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod host;
pub mod inventory;

pub use host::{load_host, parse_host};
pub use inventory::{Inventory, InventoryBuilder};
