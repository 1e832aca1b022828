// ── Domain model ──
//
// Canonical typed forms of listening ports and redirect rules. Conversion
// to and from UCI text happens only in `convert`.

pub mod port;
pub mod redirect;

pub use port::{PortBinding, Protocol};
pub use redirect::{ExistingRedirect, RedirectKey, RedirectRule, TARGET_DNAT, ZONE_LAN, ZONE_WAN};
