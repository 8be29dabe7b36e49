mod middleware;
mod public;

pub use middleware::RequestContext;
pub use public::{BANNER, HttpState, build_router};
