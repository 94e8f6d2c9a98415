//! Built-in configuration used when no sprout.toml is present

use indexmap::IndexMap;
use sprout_core::types::{PackageReference, ServerDescriptor, ServerEntries, ServerList, ServerListInfo};

use crate::file::SproutToml;

/// Name of the public release server list
pub const DEFAULT_SERVER_LIST: &str = "oswframe2k20";

const MIRRORS: [(&str, &str, &str); 4] = [
    (
        "1",
        "osWFrame Release Server #1 (hosted by jbs-newmedia.de)",
        "https://jbs-newmedia.de/oswsource2k20/index.php",
    ),
    (
        "2",
        "osWFrame Release Server #2 (hosted by hetzner.de)",
        "https://srcmi.eu/oswsource2k20/index.php",
    ),
    (
        "3",
        "osWFrame Release Server #3 (hosted by ionos.de)",
        "https://srcma.eu/oswsource2k20/index.php",
    ),
    (
        "4",
        "osWFrame Release Server #4 (hosted by all-inkl.com)",
        "https://srcmc.eu/oswsource2k20/index.php",
    ),
];

/// The public server list and the tool packages every site starts with
pub fn builtin_config() -> SproutToml {
    let data: IndexMap<String, ServerDescriptor> = MIRRORS
        .iter()
        .map(|(id, name, url)| {
            (
                id.to_string(),
                ServerDescriptor {
                    id: id.to_string(),
                    name: name.to_string(),
                    url: url.to_string(),
                },
            )
        })
        .collect();

    let list = ServerList {
        info: ServerListInfo {
            name: "osWFrame2k20".to_string(),
            package: "tools.main".to_string(),
        },
        data: ServerEntries::Keyed(data),
    };

    let mut server_lists = IndexMap::new();
    server_lists.insert(DEFAULT_SERVER_LIST.to_string(), list);

    SproutToml {
        server_lists,
        install: vec![
            PackageReference::new("tools.main", "stable", DEFAULT_SERVER_LIST),
            PackageReference::new("tools.toolmanager", "stable", DEFAULT_SERVER_LIST),
        ],
        ..SproutToml::default()
    }
}
