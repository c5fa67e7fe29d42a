use clap::Subcommand;
use focuscycle_core::settings::Preference;
use focuscycle_core::TimerSettings;

use crate::app::App;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all settings as JSON
    Show,
    /// Set the timer durations in minutes
    SetTimer {
        /// Focus length (1-180)
        work: u32,
        /// Short rest length (1-60)
        short_rest: u32,
        /// Long rest length (1-120)
        long_rest: u32,
        /// Focus intervals before a long rest (1-10)
        cycles: u32,
    },
    /// Toggle a notification preference (sound, vibration, notification)
    SetPref {
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;

    let settings = match action {
        SettingsAction::Show => app.settings.get(),
        SettingsAction::SetTimer {
            work,
            short_rest,
            long_rest,
            cycles,
        } => app.settings.update_timer_settings(TimerSettings {
            work_minutes: work,
            short_rest_minutes: short_rest,
            long_rest_minutes: long_rest,
            cycles_before_long_rest: cycles,
        })?,
        SettingsAction::SetPref { key, enabled } => {
            let pref: Preference = key.parse()?;
            app.settings.set_preference(pref, enabled)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
