//! Audio controller power save
//!
//! Keeps the HDA controller awake (fixes the pop/dropout after silence) and
//! makes sure the mixer path is unmuted.

use super::persist::{persist_block, PersistOutcome};
use super::{Outcome, RemediationResult};
use crate::command_exec::CommandRunner;
use crate::config::PathSettings;
use crate::decision::RemediationId;
use crate::error::AirtightError;

pub const AUDIO_POWER_SAVE_BLOCK: &str = "# AirTIGHT Audio Stability Fix\n\
options snd_hda_intel power_save=0 power_save_controller=N\n";

fn unmute_master<R: CommandRunner>(runner: &R) -> Result<(), AirtightError> {
    if !runner.is_available("amixer") {
        return Err(AirtightError::DependencyMissing("amixer".to_string()));
    }
    let output = runner.run("amixer", &["sset", "Master", "unmute"])?;
    if !output.success() {
        return Err(AirtightError::ReloadFailed(format!(
            "amixer: {}",
            output.failure_summary()
        )));
    }
    Ok(())
}

pub(super) fn disable_audio_power_save<R: CommandRunner>(
    runner: &R,
    paths: &PathSettings,
) -> RemediationResult {
    let mut result = RemediationResult::new(RemediationId::DisableAudioPowerSave);
    let conf = paths.audio_conf();

    match persist_block(&conf, AUDIO_POWER_SAVE_BLOCK) {
        Ok(PersistOutcome::AlreadyPresent) => {
            result.note(format!("Power-save fix already present in {}", conf.display()));
            return result.finish(Outcome::AlreadyApplied);
        }
        Ok(PersistOutcome::Written { backup }) => {
            if let Some(backup) = backup {
                result.note(format!("Backup created: {}", backup.display()));
            }
            result.note(format!("Persistent audio fix written: {}", conf.display()));
            result.reboot_required = true;
        }
        Err(e) => {
            result.degraded(e);
            return result.finish(Outcome::Failed(format!("could not write {}", conf.display())));
        }
    }

    match unmute_master(runner) {
        Ok(()) => result.note("ALSA Master channel unmuted"),
        Err(e) => result.degraded(e),
    }

    result.finish(Outcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::backup_path;
    use crate::remediation::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_writes_block_and_unmutes() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let runner = RecordingRunner::default();

        let result = disable_audio_power_save(&runner, &paths);

        assert_eq!(result.outcome, Outcome::Applied);
        assert!(result.reboot_required);
        assert_eq!(runner.calls(), vec!["amixer sset Master unmute"]);
        assert_eq!(
            fs::read_to_string(paths.audio_conf()).unwrap(),
            AUDIO_POWER_SAVE_BLOCK
        );
    }

    #[test]
    fn test_missing_amixer_is_not_failure() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let runner = RecordingRunner::default().without("amixer");

        let result = disable_audio_power_save(&runner, &paths);
        assert_eq!(result.outcome, Outcome::Applied);
        assert!(result.notes.iter().any(|n| n.contains("amixer")));
    }

    #[test]
    fn test_existing_user_config_backed_up() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        fs::create_dir_all(&paths.modprobe_dir).unwrap();
        fs::write(paths.audio_conf(), "options snd_hda_intel power_save=1\n").unwrap();
        let runner = RecordingRunner::default();

        disable_audio_power_save(&runner, &paths);

        assert_eq!(
            fs::read_to_string(backup_path(&paths.audio_conf())).unwrap(),
            "options snd_hda_intel power_save=1\n"
        );
    }
}
