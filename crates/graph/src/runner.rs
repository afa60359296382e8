use crate::error::Result;

/// Runs an external command and returns its standard output.
///
/// Implementations report a non-zero exit through the diagnostics sink and
/// return [`GraphError::Execution`](crate::GraphError::Execution).
pub trait CommandRunner {
    fn run(&self, args: &[String], input: Option<&str>) -> Result<String>;
}

impl<F> CommandRunner for F
where
    F: Fn(&[String], Option<&str>) -> Result<String>,
{
    fn run(&self, args: &[String], input: Option<&str>) -> Result<String> {
        self(args, input)
    }
}

/// Executables used for the store queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCommands {
    pub nix: String,
    pub nix_store: String,
}

impl Default for StoreCommands {
    fn default() -> Self {
        Self {
            nix: "nix".to_string(),
            nix_store: "nix-store".to_string(),
        }
    }
}

impl StoreCommands {
    pub fn new(nix: impl Into<String>, nix_store: impl Into<String>) -> Self {
        Self {
            nix: nix.into(),
            nix_store: nix_store.into(),
        }
    }

    /// `nix path-info --recursive --json --size --closure-size <root>`
    pub fn path_info(&self, root: &str) -> Vec<String> {
        [
            self.nix.as_str(),
            "path-info",
            "--recursive",
            "--json",
            "--size",
            "--closure-size",
            root,
        ]
        .map(str::to_string)
        .to_vec()
    }

    /// `nix-store --query --deriver <paths...>`
    pub fn query_derivers(&self, paths: &[String]) -> Vec<String> {
        let mut args = vec![
            self.nix_store.clone(),
            "--query".to_string(),
            "--deriver".to_string(),
        ];
        args.extend(paths.iter().cloned());
        args
    }

    /// `nix derivation show --stdin --no-pretty`
    pub fn show_derivations(&self) -> Vec<String> {
        [self.nix.as_str(), "derivation", "show", "--stdin", "--no-pretty"]
            .map(str::to_string)
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_configured_programs() {
        let commands = StoreCommands::new("/opt/nix/bin/nix", "/opt/nix/bin/nix-store");

        assert_eq!(commands.path_info("/nix/store/a")[0], "/opt/nix/bin/nix");
        assert_eq!(
            commands.query_derivers(&["/nix/store/a".to_string()]),
            ["/opt/nix/bin/nix-store", "--query", "--deriver", "/nix/store/a"]
        );
        assert_eq!(
            commands.show_derivations(),
            ["/opt/nix/bin/nix", "derivation", "show", "--stdin", "--no-pretty"]
        );
    }

    #[test]
    fn closures_are_runners() {
        let runner = |args: &[String], input: Option<&str>| -> Result<String> {
            Ok(format!("{}:{}", args.join(" "), input.unwrap_or("-")))
        };
        let out = runner
            .run(&["echo".to_string(), "hi".to_string()], Some("in"))
            .unwrap();

        assert_eq!(out, "echo hi:in");
    }
}
