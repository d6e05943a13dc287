//! Fixed facts about the ONOS image and its Karaf user realm

/// Port the ONOS REST API and GUI listen on
pub const WEB_PORT: u16 = 8181;

/// Install location of ONOS inside the workload container
pub const ROOT_FOLDER: &str = "/root/onos";

/// Name of the pebble service (and layer) running ONOS
pub const SERVICE_NAME: &str = "onos";

/// Application always activated at boot
pub const SYS_APP: &str = "org.onosproject.drivers";

/// Web GUI application, toggled by `enable-gui`
pub const GUI_APP: &str = "org.onosproject.gui2";

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_GROUP_NAME: &str = "admingroup";

pub const GUEST_USERNAME: &str = "guest";
pub const GUEST_GROUP_NAME: &str = "guestgroup";

pub const RESERVED_USERNAMES: [&str; 2] = [ADMIN_USERNAME, GUEST_USERNAME];
pub const RESERVED_GROUP_NAMES: [&str; 2] = [ADMIN_GROUP_NAME, GUEST_GROUP_NAME];

pub fn is_reserved_username(name: &str) -> bool {
    RESERVED_USERNAMES.contains(&name)
}

pub fn is_reserved_group_name(name: &str) -> bool {
    RESERVED_GROUP_NAMES.contains(&name)
}
