// src/render/nginx.rs

//! nginx virtual hosts bound to Unix sockets.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Index files tried for directory requests
pub const DEFAULT_INDEX: &[&str] = &["index.html", "index.htm"];

/// Response headers attached to every site
pub const HARDENING_HEADERS: &[(&str, &str)] = &[
    ("X-Frame-Options", "DENY"),
    ("X-Content-Type-Options", "nosniff"),
    ("Referrer-Policy", "no-referrer"),
];

/// Where a virtual host accepts connections
///
/// Only Unix sockets are supported; Tor provides transport security, so
/// there is no TCP or TLS listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "lowercase")]
pub enum Listen {
    Unix(PathBuf),
}

impl Listen {
    fn to_directive(&self) -> String {
        match self {
            Listen::Unix(path) => format!("unix:{}", path.display()),
        }
    }
}

/// One nginx `server` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub listen: Listen,
    pub root: PathBuf,
    pub index: Vec<String>,
    pub headers: Vec<(String, String)>,
    /// Refuse any request whose path has a segment starting with `.`
    pub deny_dotfiles: bool,
}

impl VirtualHost {
    fn write_block(&self, out: &mut String) {
        let _ = writeln!(out, "# {}", self.name);
        let _ = writeln!(out, "server {{");
        let _ = writeln!(out, "    listen {};", self.listen.to_directive());
        let _ = writeln!(out, "    server_name _;");
        let _ = writeln!(out, "    root {};", self.root.display());
        if !self.index.is_empty() {
            let _ = writeln!(out, "    index {};", self.index.join(" "));
        }
        let _ = writeln!(out);
        for (name, value) in &self.headers {
            let _ = writeln!(out, "    add_header {} \"{}\" always;", name, value);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "    location / {{");
        let _ = writeln!(out, "        try_files $uri $uri/ =404;");
        let _ = writeln!(out, "    }}");
        if self.deny_dotfiles {
            let _ = writeln!(out);
            let _ = writeln!(out, "    location ~ /\\. {{");
            let _ = writeln!(out, "        deny all;");
            let _ = writeln!(out, "    }}");
        }
        let _ = writeln!(out, "}}");
    }
}

/// The nginx fragment: one server block per site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NginxVHostConfig {
    pub hosts: Vec<VirtualHost>,
}

impl NginxVHostConfig {
    /// Render as nginx configuration, suitable for an `http {}` include
    pub fn to_nginx_conf(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Generated by onionsite. Do not edit.");
        for host in &self.hosts {
            let _ = writeln!(out);
            host.write_block(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> VirtualHost {
        VirtualHost {
            name: "blog".to_string(),
            listen: Listen::Unix(PathBuf::from("/run/x/blog.sock")),
            root: PathBuf::from("/var/www/blog"),
            index: DEFAULT_INDEX.iter().map(|s| s.to_string()).collect(),
            headers: HARDENING_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            deny_dotfiles: true,
        }
    }

    #[test]
    fn test_server_block() {
        let conf = NginxVHostConfig { hosts: vec![host()] }.to_nginx_conf();

        assert!(conf.contains("    listen unix:/run/x/blog.sock;\n"));
        assert!(conf.contains("    root /var/www/blog;\n"));
        assert!(conf.contains("    index index.html index.htm;\n"));
        assert!(conf.contains("add_header X-Frame-Options \"DENY\" always;"));
        assert!(conf.contains("add_header X-Content-Type-Options \"nosniff\" always;"));
        assert!(conf.contains("add_header Referrer-Policy \"no-referrer\" always;"));
        assert!(conf.contains("location ~ /\\. {\n        deny all;\n    }"));
        assert!(!conf.contains("ssl"));
        assert_eq!(conf.matches("listen ").count(), 1);
    }

    #[test]
    fn test_braces_balanced() {
        let conf = NginxVHostConfig {
            hosts: vec![host(), host()],
        }
        .to_nginx_conf();
        assert_eq!(conf.matches('{').count(), conf.matches('}').count());
        assert_eq!(conf.matches("server {").count(), 2);
    }

    #[test]
    fn test_dotfile_rule_optional() {
        let mut h = host();
        h.deny_dotfiles = false;
        let conf = NginxVHostConfig { hosts: vec![h] }.to_nginx_conf();
        assert!(!conf.contains("deny all"));
    }
}
