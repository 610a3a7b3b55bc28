mod catalog;
mod export;
mod helpers;
mod settings;
mod sync;

pub(crate) use catalog::{cmd_list, cmd_price};
pub(crate) use export::{PDF_FILENAME, cmd_export};
pub(crate) use settings::{SettingsUpdate, cmd_settings_set, cmd_settings_show};
pub(crate) use sync::cmd_sync;
