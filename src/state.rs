use std::sync::Arc;

use crate::activity::ActivityLogger;
use crate::resolver::Resolver;

// app's shared state
pub struct AppState {
    pub resolver: Resolver,
    // present only for the sqlite backend
    pub activity: Option<Arc<ActivityLogger>>,
}
