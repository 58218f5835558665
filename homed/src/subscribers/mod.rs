mod activity;
mod usage;

use crate::state::AppState;

pub fn spawn_all(app: AppState) {
    activity::spawn(app.clone());
    usage::spawn(app);
}
