use std::fmt::Write;

use sshman_core::Identity;

const RULE: &str = "==============================";

/// Human-readable listing, sorted by name.
pub fn render(identities: &[Identity]) -> String {
    if identities.is_empty() {
        return "No identities configured\n".to_string();
    }

    let mut sorted: Vec<&Identity> = identities.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = format!("SSH Identities:\n{RULE}\n");
    for identity in sorted {
        let _ = writeln!(out);
        let _ = writeln!(out, "Name: {}", identity.name);
        let _ = writeln!(out, "Username: {}", identity.username);
        let _ = writeln!(out, "Address: {}", identity.address);
        if identity.port != 0 {
            let _ = writeln!(out, "Port: {}", identity.port);
        }
        let _ = writeln!(out, "Description: {}", identity.description);
    }
    out
}
