// SPDX-License-Identifier: GPL-3.0-only

//! Legacy `<protocol>:...` backing strings (nbd, rbd, sheepdog).

use storage_types::{NetHost, NetProtocol, StorageSource};

use crate::error::{BackingError, Result};
use crate::spec::BackingSpec;

const NBD_EXPORT_MARKER: &str = ":exportname=";

pub(crate) fn parse(spec: &str, input: &str) -> Result<BackingSpec> {
    let (prefix, rest) = input
        .split_once(':')
        .ok_or_else(|| BackingError::malformed(spec, "missing protocol prefix"))?;

    let protocol = prefix
        .parse::<NetProtocol>()
        .map_err(|_| BackingError::malformed(spec, format!("unknown protocol '{prefix}'")))?;

    let source = match protocol {
        NetProtocol::Nbd => parse_nbd(spec, rest)?,
        NetProtocol::Rbd => parse_rbd(spec, rest)?,
        NetProtocol::Sheepdog => {
            if rest.is_empty() {
                return Err(BackingError::malformed(spec, "missing sheepdog vdi name"));
            }
            let mut source = StorageSource::new_network(protocol);
            source.name = Some(rest.to_string());
            source
        }
        other => {
            return Err(BackingError::malformed(
                spec,
                format!("protocol '{other}' has no colon syntax"),
            ));
        }
    };

    Ok(BackingSpec::secure(source))
}

/// `unix:<socket>[:exportname=<export>]` or `<host>:<port>[:exportname=<export>]`
fn parse_nbd(spec: &str, rest: &str) -> Result<StorageSource> {
    let (address, export) = match rest.find(NBD_EXPORT_MARKER) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + NBD_EXPORT_MARKER.len()..])),
        None => (rest, None),
    };

    let host = if let Some(socket) = address.strip_prefix("unix:") {
        if socket.is_empty() {
            return Err(BackingError::malformed(spec, "missing nbd socket path"));
        }
        NetHost::unix(socket)
    } else {
        let (name, remainder) = match address.strip_prefix('[') {
            Some(bracketed) => {
                let (name, after) = bracketed
                    .split_once(']')
                    .ok_or_else(|| BackingError::malformed(spec, "unterminated IPv6 address"))?;
                let remainder = after
                    .strip_prefix(':')
                    .ok_or_else(|| BackingError::malformed(spec, "missing nbd port"))?;
                (name, remainder)
            }
            None => address
                .split_once(':')
                .ok_or_else(|| BackingError::malformed(spec, "missing nbd port"))?,
        };
        if name.is_empty() {
            return Err(BackingError::malformed(spec, "missing nbd host"));
        }
        let port = remainder.split(':').next().unwrap_or_default();
        NetHost::tcp(name, Some(parse_port(spec, port)?))
    };

    let mut source = StorageSource::new_network(NetProtocol::Nbd);
    source.name = export.map(str::to_string);
    source.hosts.push(host);
    Ok(source)
}

/// `<pool>/<image>[@<snapshot>][:<option>=<value>]*`, `\` escapes delimiters.
pub(crate) fn parse_rbd(spec: &str, rest: &str) -> Result<StorageSource> {
    let (image, mut options) = split_unescaped(rest, ':');

    let (image, snapshot) = match image.split_once('@') {
        Some((image, snapshot)) => (image, Some(snapshot)),
        None => (image, None),
    };
    if image.is_empty() {
        return Err(BackingError::malformed(spec, "missing rbd image name"));
    }

    let mut source = StorageSource::new_network(NetProtocol::Rbd);
    source.name = Some(unescape(image));
    source.snapshot = snapshot.map(unescape);

    while let Some(remaining) = options {
        let (option, next) = split_unescaped(remaining, ':');
        if let Some(user) = option.strip_prefix("id=") {
            source.user = Some(unescape(user));
        } else if let Some(hosts) = option.strip_prefix("mon_host=") {
            for entry in split_mon_hosts(hosts) {
                source.hosts.push(parse_rbd_host(spec, entry)?);
            }
        } else if let Some(conf) = option.strip_prefix("conf=") {
            source.config_file = Some(unescape(conf));
        }
        options = next;
    }

    Ok(source)
}

fn parse_port(spec: &str, port: &str) -> Result<u16> {
    port.parse()
        .map_err(|_| BackingError::malformed(spec, format!("invalid port '{port}'")))
}

/// Split at the first `delim` not preceded by a backslash.
fn split_unescaped(input: &str, delim: char) -> (&str, Option<&str>) {
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            return (&input[..idx], Some(&input[idx + ch.len_utf8()..]));
        }
    }
    (input, None)
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            other => out.push(other),
        }
    }
    out
}

/// Monitor hosts are separated by an escaped `;`, `,` or space.
fn split_mon_hosts(hosts: &str) -> Vec<&str> {
    let bytes = hosts.as_bytes();
    let mut entries = Vec::new();
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        if bytes[idx] == b'\\' {
            if matches!(bytes.get(idx + 1), Some(b';' | b',' | b' ')) {
                entries.push(&hosts[start..idx]);
                start = idx + 2;
            }
            idx += 2;
        } else {
            idx += 1;
        }
    }
    if start < hosts.len() {
        entries.push(&hosts[start..]);
    }

    entries.retain(|entry| !entry.is_empty());
    entries
}

/// `host[\:port]`, with IPv6 literals kept in brackets.
fn parse_rbd_host(spec: &str, entry: &str) -> Result<NetHost> {
    let search_from = entry.find(']').unwrap_or(0);
    let (name, port) = match entry[search_from..].find("\\:") {
        Some(offset) => {
            let at = search_from + offset;
            (&entry[..at], Some(parse_port(spec, &entry[at + 2..])?))
        }
        None => (entry, None),
    };
    Ok(NetHost::tcp(name.replace("\\:", ":"), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> StorageSource {
        parse(input, input).expect("valid colon string").source
    }

    #[test]
    fn nbd_tcp_export() {
        let source = parse_ok("nbd:example.org:6000:exportname=blah");
        assert_eq!(source.protocol, NetProtocol::Nbd);
        assert_eq!(source.name.as_deref(), Some("blah"));
        assert_eq!(source.hosts, vec![NetHost::tcp("example.org", Some(6000))]);
    }

    #[test]
    fn nbd_export_may_contain_colons() {
        assert_eq!(parse_ok("nbd:example.org:6000:exportname=:").name.as_deref(), Some(":"));
        assert_eq!(
            parse_ok("nbd:example.org:6000:exportname=:test").name.as_deref(),
            Some(":test")
        );
    }

    #[test]
    fn nbd_ipv6_brackets_are_stripped() {
        let source = parse_ok("nbd:[::1]:6000:exportname=:test");
        assert_eq!(source.hosts, vec![NetHost::tcp("::1", Some(6000))]);
    }

    #[test]
    fn nbd_unix_socket_keeps_trailing_colon() {
        let source = parse_ok("nbd:unix:/tmp/sock:exportname=/");
        assert_eq!(source.hosts, vec![NetHost::unix("/tmp/sock")]);
        assert_eq!(source.name.as_deref(), Some("/"));

        let source = parse_ok("nbd:unix:/tmp/sock:");
        assert_eq!(source.hosts, vec![NetHost::unix("/tmp/sock:")]);
        assert_eq!(source.name, None);

        let source = parse_ok("nbd:unix:/tmp/sock::exportname=:");
        assert_eq!(source.hosts, vec![NetHost::unix("/tmp/sock:")]);
        assert_eq!(source.name.as_deref(), Some(":"));
    }

    #[test]
    fn nbd_without_port_is_malformed() {
        assert!(parse("nbd:example.org", "nbd:example.org").is_err());
        assert!(parse("nbd:example.org:http", "nbd:example.org:http").is_err());
    }

    #[test]
    fn rbd_options() {
        let source = parse_ok("rbd:testshare:id=asdf:mon_host=example.com");
        assert_eq!(source.protocol, NetProtocol::Rbd);
        assert_eq!(source.name.as_deref(), Some("testshare"));
        assert_eq!(source.user.as_deref(), Some("asdf"));
        assert_eq!(source.hosts, vec![NetHost::tcp("example.com", None)]);
    }

    #[test]
    fn rbd_multiple_monitors_and_snapshot() {
        let source = parse_ok(
            "rbd:pool/image@snap:mon_host=mon1.example.org\\:6321\\;mon2.example.org\\:6322\\;[\\:\\:1]\\:6323:conf=/etc/ceph.conf",
        );
        assert_eq!(source.name.as_deref(), Some("pool/image"));
        assert_eq!(source.snapshot.as_deref(), Some("snap"));
        assert_eq!(source.config_file.as_deref(), Some("/etc/ceph.conf"));
        assert_eq!(
            source.hosts,
            vec![
                NetHost::tcp("mon1.example.org", Some(6321)),
                NetHost::tcp("mon2.example.org", Some(6322)),
                NetHost::tcp("[::1]", Some(6323)),
            ]
        );
    }

    #[test]
    fn sheepdog_vdi() {
        let source = parse_ok("sheepdog:test");
        assert_eq!(source.protocol, NetProtocol::Sheepdog);
        assert_eq!(source.name.as_deref(), Some("test"));
    }

    #[test]
    fn protocols_without_colon_syntax() {
        assert!(parse("http:foo", "http:foo").is_err());
        assert!(parse("bogus:foo", "bogus:foo").is_err());
    }
}
