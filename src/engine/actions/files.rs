//! Directory listing

use chrono::NaiveDateTime;

use crate::engine::action::{Action, ActionSpec};
use crate::engine::registry::ActionRegistry;
use crate::error::RegistryError;

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(ListFiles)
}

crate::record! {
    pub struct ListFilesArgs {
        pub path: Option<String>,
        pub recursive: bool,
        pub show_hidden: bool,
    }
}

crate::record! {
    /// One `ls -l` entry
    pub struct FileEntry {
        pub permissions: String,
        pub link_count: u32,
        pub owner: String,
        pub group: String,
        pub size: u64,
        pub date: NaiveDateTime,
        pub name: String,
    }
}

/// `ls -l` with a global match, so the `total` lines and the directory
/// headers of a recursive listing are skipped.
pub struct ListFiles;

impl Action for ListFiles {
    type Args = ListFilesArgs;
    type Output = Vec<FileEntry>;

    const SPEC: ActionSpec = ActionSpec {
        name: "listFiles",
        description: "Entries of a directory as reported by ls -l",
        command: "LC_ALL=C ls -l ?[recursive]-R ?[showHidden]-A {path}",
        pattern: Some(
            r"^(?P<permissions>[-dlcbps][rwxsStT-]{9}[@+.]?)\s+(?P<linkCount>\d+)\s+(?P<owner>\S+)\s+(?P<group>\S+)\s+(?P<size>\d+)\s+(?P<date>\w{3}\s+\d{1,2}\s+(?:\d{1,2}:\d{2}|\d{4}))\s+(?P<name>.+)$",
        ),
        multiline: true,
        ..ActionSpec::EMPTY
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action::ActionDescriptor;
    use crate::engine::convert::{convert_arguments, ActionOutput, ListParsePolicy, Record};
    use crate::engine::template;
    use crate::parser::ast::{Field, Literal};

    const LISTING: &str = "\
/var/log:
total 24
drwxr-xr-x  2 root   root   4096 Mar  5 14:02 apt
-rw-r-----  1 syslog adm   81234 Mar  5  2023 auth.log
lrwxrwxrwx  1 root   root     12 Jan 10 09:15 current -> journal log

/var/log/apt:
total 4
-rw-r--r--  1 root root 1533 Feb 28 11:00 history.log
";

    #[test]
    fn test_command_flags() {
        let field = Field::new("listFiles")
            .with_argument("path", Literal::Str("/var/log".to_string()))
            .with_argument("recursive", Literal::Bool(true));
        let args: ListFilesArgs = convert_arguments(&field.arguments).unwrap();
        let command = template::render(ListFiles::SPEC.command, &args.template_values());
        assert_eq!(command, "LC_ALL=C ls -l -R /var/log");
    }

    #[test]
    fn test_parse_listing() {
        let descriptor = ActionDescriptor::from_action::<ListFiles>().unwrap();
        let pattern = descriptor.result_pattern().unwrap();
        let entries =
            Vec::<FileEntry>::from_pattern(LISTING, pattern, ListParsePolicy::Strict).unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["apt", "auth.log", "current -> journal log", "history.log"]);

        let auth = &entries[1];
        assert_eq!(auth.permissions, "-rw-r-----");
        assert_eq!(auth.link_count, 1);
        assert_eq!(auth.owner, "syslog");
        assert_eq!(auth.group, "adm");
        assert_eq!(auth.size, 81234);
        assert_eq!(auth.date.format("%Y-%m-%d").to_string(), "2023-03-05");
    }
}
