/*!
    Window configuration.
*/

/**
    Title and initial size of the output window.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl DisplayConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "EasyFFmpeg".to_string(),
            width: 640,
            height: 480,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DisplayConfig::default();
        assert_eq!(config.title, "EasyFFmpeg");
        assert_eq!((config.width, config.height), (640, 480));
    }

    #[test]
    fn sized_config_keeps_title() {
        let config = DisplayConfig::new(1920, 1080);
        assert_eq!(config.title, "EasyFFmpeg");
        assert_eq!(config.with_title("player").title, "player");
    }
}
