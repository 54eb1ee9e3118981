use std::path::PathBuf;

use clap::Parser;

use crate::storage::parse_display_name;

pub const DEFAULT_OPERATOR: &str = "Rustan C. Lacanilo";

#[derive(Parser, Debug, Clone)]
#[command(name = "face-kiosk", version, about = "Webcam face overlay with a flat-file user registry")]
pub struct AppConfig {
    /// Camera device index
    #[arg(long = "camera", default_value_t = 0)]
    pub camera_index: u32,

    /// CSV file holding registered users
    #[arg(long = "users", default_value = "users.txt")]
    pub users_path: PathBuf,

    /// Login journal
    #[arg(long = "log", default_value = "log.txt")]
    pub log_path: PathBuf,

    /// Haar cascade used for face detection; fetched on first run if missing
    #[arg(long = "cascade", default_value = "models/haarcascade_frontalface_default.xml")]
    pub cascade_path: PathBuf,

    /// Name written to the login journal
    #[arg(
        long = "operator",
        default_value = DEFAULT_OPERATOR,
        value_parser = parse_display_name
    )]
    pub operator: String,

    /// Print the cameras Nokhwa can see and exit
    #[arg(long)]
    pub list_cameras: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_files() {
        let config = AppConfig::parse_from(["face-kiosk"]);
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.users_path, PathBuf::from("users.txt"));
        assert_eq!(config.log_path, PathBuf::from("log.txt"));
        assert_eq!(config.operator, DEFAULT_OPERATOR);
        assert!(!config.list_cameras);
    }

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::parse_from([
            "face-kiosk",
            "--camera",
            "2",
            "--users",
            "/tmp/u.csv",
            "--operator",
            "Front Desk",
        ]);
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.users_path, PathBuf::from("/tmp/u.csv"));
        assert_eq!(config.operator, "Front Desk");
    }

    #[test]
    fn blank_or_multiline_operator_is_rejected() {
        assert!(AppConfig::try_parse_from(["face-kiosk", "--operator", ""]).is_err());
        assert!(AppConfig::try_parse_from(["face-kiosk", "--operator", "Front\nDesk"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        AppConfig::command().debug_assert();
    }
}
