//! Minimal prompt rendering (§6 — informative, non-normative).
//!
//! `NAME:CWD$ ` for a regular user, `NAME-root:CWD# ` for uid 0, with
//! `~` substituted for the home-directory prefix.

use std::env;

pub fn render(shell_name: &str) -> String {
    let cwd = env::current_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| "?".to_string());
    let cwd = collapse_home(&cwd);
    let uid = nix::unistd::geteuid();

    if uid.is_root() {
        format!("{shell_name}-root:{cwd}# ")
    } else {
        format!("{shell_name}:{cwd}$ ")
    }
}

fn collapse_home(cwd: &str) -> String {
    match env::var("HOME") {
        Ok(home) if !home.is_empty() && cwd.starts_with(&home) => {
            format!("~{}", &cwd[home.len()..])
        }
        _ => cwd.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_home_prefix() {
        std::env::set_var("HOME", "/home/alsh-test-user");
        assert_eq!(collapse_home("/home/alsh-test-user/projects"), "~/projects");
        assert_eq!(collapse_home("/etc"), "/etc");
        std::env::remove_var("HOME");
    }
}
