//! Merging the servers of one owner into the server list of a shared gateway.

use std::collections::HashSet;

use netgate_model::Server;

/// Computes the next server list of a shared gateway.
///
/// * `live` is the current server list, possibly holding servers of other owners and servers added by hand.
/// * `desired` is the full list this owner wants now.
/// * `prior` is what this owner contributed before.
///
/// Live servers not structurally equal to a prior server are foreign and kept verbatim, in their original
/// order. That includes a server sitting in one of the owner's port slots whose content was edited since
/// it was written. The owner's previous servers are replaced by `desired`, appended after the foreign
/// ones. A desired server whose port name is already held by a kept server is skipped, so port names
/// never repeat. The result is never empty: an empty list becomes the placeholder server, and the
/// placeholder never accompanies real servers.
pub fn merge_servers(live: &[Server], desired: &[Server], prior: &[Server]) -> Vec<Server> {
    let mut next: Vec<Server> = live
        .iter()
        .filter(|server| !server.is_placeholder())
        .filter(|server| {
            if prior.contains(server) {
                return false;
            }
            if prior.iter().any(|owned| owned.port.name == server.port.name) {
                tracing::debug!("[NG.Merge] keep modified server in slot {}", server.port.name);
            }
            true
        })
        // a foreign copy of a desired server is taken over by the owner, so a second merge finds the same list
        .filter(|server| !desired.contains(server))
        .cloned()
        .collect();
    let taken: HashSet<String> = next.iter().map(|server| server.port.name.clone()).collect();
    next.extend(
        desired
            .iter()
            .filter(|server| !server.is_placeholder())
            .filter(|server| {
                let free = !taken.contains(&server.port.name);
                if !free {
                    tracing::debug!("[NG.Merge] slot {} is held by a kept server, skip desired server", server.port.name);
                }
                free
            })
            .cloned(),
    );
    if next.is_empty() {
        next.push(Server::placeholder());
    }
    next
}
