use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PermState {
    #[default]
    Idle,
    Requested,
    Permitted,
}

#[derive(Default)]
pub(crate) struct Permission {
    st: PermState,
    addrs: Vec<SocketAddr>,
}

impl Permission {
    pub(crate) fn set_state(&mut self, state: PermState) {
        self.st = state;
    }

    pub(crate) fn state(&self) -> PermState {
        self.st
    }
}

// PermissionMap keys permissions by peer IP; TURN permissions ignore the port.
#[derive(Default)]
pub(crate) struct PermissionMap {
    perm_map: HashMap<IpAddr, Permission>,
}

impl PermissionMap {
    pub(crate) fn new() -> Self {
        PermissionMap::default()
    }

    pub(crate) fn insert(&mut self, addr: SocketAddr, mut p: Permission) {
        if !p.addrs.contains(&addr) {
            p.addrs.push(addr);
        }
        self.perm_map.insert(addr.ip(), p);
    }

    pub(crate) fn contains(&self, addr: &SocketAddr) -> bool {
        self.perm_map.contains_key(&addr.ip())
    }

    pub(crate) fn get(&self, addr: &SocketAddr) -> Option<&Permission> {
        self.perm_map.get(&addr.ip())
    }

    pub(crate) fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Permission> {
        self.perm_map.get_mut(&addr.ip())
    }

    pub(crate) fn delete(&mut self, addr: &SocketAddr) {
        self.perm_map.remove(&addr.ip());
    }

    // addrs returns one representative address per permitted IP
    pub(crate) fn addrs(&self) -> Vec<SocketAddr> {
        self.perm_map
            .values()
            .filter_map(|p| p.addrs.first().copied())
            .collect()
    }
}
