//! Loading credentials from the OCI CLI profile store (`~/.oci/config`).
//!
//! The store is the INI file written by `oci setup config`. Only the keys the
//! signer needs are read; everything else in the file is ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{GrabError, Result};

/// One `[profile]` section of the OCI config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
}

impl Profile {
    /// The conventional location written by `oci setup config`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".oci").join("config"))
            .ok_or(GrabError::HomeDirUnknown)
    }

    /// Load the named section (conventionally `DEFAULT`) from `path`.
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        if !path.exists() {
            return Err(GrabError::ProfileMissing {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| GrabError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let section = parse_section(&text, name).ok_or_else(|| GrabError::ProfileSectionMissing {
            profile: name.to_string(),
            path: path.to_path_buf(),
        })?;

        let require = |key: &str| -> Result<String> {
            section
                .get(key)
                .cloned()
                .ok_or_else(|| GrabError::ProfileKeyMissing {
                    profile: name.to_string(),
                    path: path.to_path_buf(),
                    key: key.to_string(),
                })
        };

        Ok(Profile {
            user: require("user")?,
            fingerprint: require("fingerprint")?,
            key_file: expand_home(&require("key_file")?),
            tenancy: require("tenancy")?,
            region: require("region")?,
        })
    }
}

/// Minimal INI reader: `[section]` headers, `key=value` pairs, `#`/`;`
/// comments. Returns `None` when the section header never appears.
fn parse_section(text: &str, name: &str) -> Option<HashMap<String, String>> {
    let mut current: Option<&str> = None;
    let mut found = false;
    let mut values = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(header.trim());
            found |= current == Some(name);
            continue;
        }
        if current != Some(name) {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    found.then_some(values)
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
# comment
[DEFAULT]
user=ocid1.user.oc1..aaaa
fingerprint=12:34:56:78
key_file=/keys/oci_api_key.pem
tenancy=ocid1.tenancy.oc1..bbbb
region=ap-hyderabad-1

[HOBBY]
user=ocid1.user.oc1..cccc
fingerprint=ab:cd:ef:01
key_file=/keys/hobby.pem
tenancy=ocid1.tenancy.oc1..dddd
region=us-ashburn-1
";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_default_profile() {
        let file = write_config(SAMPLE);
        let profile = Profile::load(file.path(), "DEFAULT").expect("load");
        assert_eq!(profile.user, "ocid1.user.oc1..aaaa");
        assert_eq!(profile.region, "ap-hyderabad-1");
        assert_eq!(profile.key_file, PathBuf::from("/keys/oci_api_key.pem"));
    }

    #[test]
    fn loads_named_profile() {
        let file = write_config(SAMPLE);
        let profile = Profile::load(file.path(), "HOBBY").expect("load");
        assert_eq!(profile.tenancy, "ocid1.tenancy.oc1..dddd");
        assert_eq!(profile.region, "us-ashburn-1");
    }

    #[test]
    fn missing_file_points_at_oci_setup() {
        let err = Profile::load(Path::new("/nonexistent/.oci/config"), "DEFAULT")
            .expect_err("should fail");
        assert!(err.to_string().contains("oci setup config"), "{err}");
        assert!(err.is_auth());
    }

    #[test]
    fn missing_section_is_reported() {
        let file = write_config(SAMPLE);
        let err = Profile::load(file.path(), "NOPE").expect_err("should fail");
        assert!(err.to_string().contains("[NOPE]"), "{err}");
    }

    #[test]
    fn missing_key_names_the_key() {
        let file = write_config("[DEFAULT]\nuser=ocid1.user.oc1..aaaa\n");
        let err = Profile::load(file.path(), "DEFAULT").expect_err("should fail");
        assert!(err.to_string().contains("`fingerprint`"), "{err}");
    }
}
