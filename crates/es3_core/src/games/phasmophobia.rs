use std::env;
use std::path::{Path, PathBuf};

use crate::core_api::CoreError;
use crate::tag::ValueTag;
use crate::value::Scalar;
use crate::view::{FieldSpec, Presence, StructuredView};

use super::{GamePlugin, SaveLocation};

pub const PLUGIN_ID: &str = "phasmophobia";
pub const MONEY_KEY: &str = "PlayersMoney";
pub const EXPERIENCE_KEY: &str = "Experience";

const ES3_KEY: &str = "t36gref9u84y7f43g";
const SAVE_FILE_NAME: &str = "SaveFile.txt";

static FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        name: "money",
        label: "Money",
        key: MONEY_KEY,
        tag: ValueTag::Integer,
    },
    FieldSpec {
        name: "experience",
        label: "Experience",
        key: EXPERIENCE_KEY,
        tag: ValueTag::Integer,
    },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct Phasmophobia;

impl Phasmophobia {
    /// Save locations below a Windows user profile directory.
    pub fn locations_for_profile(profile: &Path) -> Vec<SaveLocation> {
        let base = profile
            .join("AppData")
            .join("LocalLow")
            .join("Kinetic Games")
            .join("Phasmophobia");
        vec![SaveLocation {
            label: "Default Save".to_string(),
            path: base.join(SAVE_FILE_NAME),
        }]
    }
}

impl GamePlugin for Phasmophobia {
    fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn name(&self) -> &'static str {
        "Phasmophobia"
    }

    fn default_locations(&self) -> Vec<SaveLocation> {
        match env::var_os("USERPROFILE") {
            Some(profile) if !profile.is_empty() => {
                Self::locations_for_profile(&PathBuf::from(profile))
            }
            _ => Vec::new(),
        }
    }

    fn codec_key(&self) -> &'static str {
        ES3_KEY
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }
}

/// Typed access to the player fields of a Phasmophobia view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub money: Presence<i64>,
    pub experience: Presence<i64>,
}

impl PlayerStats {
    pub fn from_view(view: &StructuredView) -> Self {
        Self {
            money: integer_field(view, "money"),
            experience: integer_field(view, "experience"),
        }
    }

    /// Writes present values into `view`. Missing values leave the view as it is.
    pub fn apply_to(&self, view: &mut StructuredView) -> Result<(), CoreError> {
        if let Presence::Present(money) = self.money {
            view.set("money", Scalar::Integer(money))?;
        }
        if let Presence::Present(experience) = self.experience {
            view.set("experience", Scalar::Integer(experience))?;
        }
        Ok(())
    }
}

fn integer_field(view: &StructuredView, name: &str) -> Presence<i64> {
    match view.get(name) {
        Some(Presence::Present(Scalar::Integer(v))) => Presence::Present(*v),
        _ => Presence::Missing,
    }
}
