//! # Utility Functions Module
//!
//! Small helpers that keep command-line construction readable.

/// Builds an argument vector from items of any `ToString` type.
///
/// Each item is converted on its own, so literals, numbers and owned strings can be
/// mixed freely.
///
/// # Example
/// ```rust
/// use media_compressor::args;
///
/// let crf = 23;
/// let args = args!["-crf", crf, "-preset", String::from("medium")];
/// assert_eq!(args, vec!["-crf", "23", "-preset", "medium"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_args_macro_mixed_types() {
        let quality = 85u8;
        let bitrate = format!("{}k", 128);
        let result = args!["-q:v", quality, "-b:a", bitrate, "-frames:v", 1];
        assert_eq!(result, vec!["-q:v", "85", "-b:a", "128k", "-frames:v", "1"]);
    }

    #[test]
    fn test_args_macro_empty() {
        let result: Vec<String> = args![];
        assert!(result.is_empty());
    }
}
