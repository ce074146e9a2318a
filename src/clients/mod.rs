//! External service clients.

pub mod mock;
pub mod reseller;
pub mod uptime;

pub use mock::{MockAllocation, MockProxyProvider, MockUptimeProbe};
pub use reseller::{ResellerClient, ResellerConfig};
pub use uptime::HttpUptimeProbe;
