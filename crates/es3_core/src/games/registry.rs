use crate::core_api::CoreError;

use super::GamePlugin;
use super::phasmophobia::Phasmophobia;

static PHASMOPHOBIA: Phasmophobia = Phasmophobia;

static PLUGINS: [&'static dyn GamePlugin; 1] = [&PHASMOPHOBIA];

pub fn all_plugins() -> &'static [&'static dyn GamePlugin] {
    &PLUGINS
}

pub fn plugin_by_id(id: &str) -> Result<&'static dyn GamePlugin, CoreError> {
    PLUGINS
        .iter()
        .copied()
        .find(|plugin| plugin.id() == id)
        .ok_or_else(|| CoreError::not_found(format!("no plugin with id '{id}'")))
}
