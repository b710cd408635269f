// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{
    HttpCookie, HttpOptions, NetHost, NetProtocol, NfsIdentity, NvmeTarget, PciAddress,
    StorageKind, StorageSource,
};

use super::props::{Props, inet_address, server_objects, socket_address};
use crate::error::{BackingError, Result};
use crate::spec::{BackingSpec, ParseStatus};
use crate::{colon, uri};

const ISCSI_DEFAULT_LUN: u64 = 0;

pub(super) fn parse_protocol(props: Props<'_>, driver: &str) -> Result<BackingSpec> {
    match driver {
        "file" => local(props, StorageKind::File),
        "host_device" | "host_cdrom" => local(props, StorageKind::Block),
        "http" | "https" | "ftp" | "ftps" | "tftp" => curl(props),
        "gluster" => gluster(props),
        "iscsi" => iscsi(props),
        "nbd" => nbd(props),
        "sheepdog" => sheepdog(props),
        "ssh" => ssh(props),
        "rbd" => rbd(props),
        "vxhs" => vxhs(props),
        "nfs" => nfs(props),
        "nvme" => nvme(props),
        other => Err(BackingError::UnsupportedDriver {
            spec: props.spec.to_string(),
            driver: other.to_string(),
        }),
    }
}

fn local(props: Props<'_>, kind: StorageKind) -> Result<BackingSpec> {
    let mut source = StorageSource::new_file(props.required_str("filename")?);
    source.kind = kind;
    Ok(BackingSpec::secure(source))
}

/// Parse a URI-valued property and require its scheme to name `protocol`.
fn uri_for(props: &Props<'_>, input: &str, protocol: NetProtocol) -> Result<BackingSpec> {
    let parsed = uri::parse(props.spec, input)?;
    if parsed.source.protocol != protocol {
        return Err(props.error(format_args!(
            "URI scheme '{}' does not match the driver",
            parsed.source.protocol
        )));
    }
    Ok(parsed)
}

fn curl(props: Props<'_>) -> Result<BackingSpec> {
    let protocol: NetProtocol = props
        .driver
        .parse()
        .map_err(|_| props.error("unknown curl protocol"))?;
    let mut parsed = uri_for(&props, props.required_str("url")?, protocol)?;

    let mut options = HttpOptions {
        timeout: props.number("timeout")?,
        readahead: props.number("readahead")?,
        ..HttpOptions::default()
    };
    if matches!(protocol, NetProtocol::Https | NetProtocol::Ftps) {
        options.ssl_verify = props.flag("sslverify")?;
    }
    if let Some(cookies) = props.str("cookie")? {
        options.cookies = parse_cookies(&props, cookies)?;
    }
    if !options.is_empty() {
        parsed.source.http = Some(options);
    }
    Ok(parsed)
}

/// `name=value; name2=value2`, values kept verbatim including quotes.
fn parse_cookies(props: &Props<'_>, cookies: &str) -> Result<Vec<HttpCookie>> {
    cookies
        .split(';')
        .map(str::trim)
        .filter(|cookie| !cookie.is_empty())
        .map(|cookie| match cookie.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(HttpCookie {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(props.error(format_args!("invalid cookie '{cookie}'"))),
        })
        .collect()
}

fn gluster(props: Props<'_>) -> Result<BackingSpec> {
    if let Some(filename) = props.str("filename")? {
        return uri_for(&props, filename, NetProtocol::Gluster);
    }

    let volume = props.required_str("volume")?;
    let path = props.required_str("path")?;
    let servers = server_objects(&props)?;
    if servers.is_empty() {
        return Err(props.error("at least one 'server' is required"));
    }

    let mut source = StorageSource::new_network(NetProtocol::Gluster);
    source.name = Some(format!("{volume}/{path}"));
    for server in &servers {
        let host = socket_address(server)?;
        source
            .hosts
            .push(host.with_default_port(NetProtocol::Gluster.default_port()));
    }
    Ok(BackingSpec::secure(source))
}

fn iscsi(props: Props<'_>) -> Result<BackingSpec> {
    if let Some(filename) = props.str("filename")? {
        return uri_for(&props, filename, NetProtocol::Iscsi);
    }

    let portal = props.required_str("portal")?;
    let target = props.required_str("target")?;
    let lun = props.number("lun")?.unwrap_or(ISCSI_DEFAULT_LUN);

    // skip the colons of a bracketed IPv6 literal before looking for the port
    let port_search = portal.find(']').unwrap_or(0);
    let (name, port) = match portal[port_search..].find(':') {
        Some(offset) => {
            let at = port_search + offset;
            let port = &portal[at + 1..];
            let port: u16 = port
                .parse()
                .map_err(|_| props.error(format_args!("invalid portal port '{port}'")))?;
            (&portal[..at], Some(port))
        }
        None => (portal, None),
    };
    if name.is_empty() {
        return Err(props.error("missing portal host"));
    }

    let port = port.or(NetProtocol::Iscsi.default_port());
    let host = match props.str("transport")?.unwrap_or("tcp") {
        "tcp" => NetHost::tcp(name, port),
        "rdma" => NetHost::Rdma {
            name: name.to_string(),
            port,
        },
        other => return Err(props.error(format_args!("unsupported transport '{other}'"))),
    };

    let mut source = StorageSource::new_network(NetProtocol::Iscsi);
    source.name = Some(format!("{target}/{lun}"));
    source.hosts.push(host);

    let status = if props.str("user")?.is_some() || props.str("password")?.is_some() {
        ParseStatus::InsecureCredentials
    } else {
        ParseStatus::Secure
    };
    Ok(BackingSpec { source, status })
}

fn nbd(props: Props<'_>) -> Result<BackingSpec> {
    if let Some(filename) = props.str("filename")? {
        return if filename.contains("://") {
            uri_for(&props, filename, NetProtocol::Nbd)
        } else {
            colon::parse(props.spec, filename)
        };
    }

    let host = if let Some(server) = props.object("server")? {
        socket_address(&props.nested(server))?
    } else if let Some(path) = props.str("path")? {
        NetHost::unix(path)
    } else if let Some(host) = props.str("host")? {
        NetHost::tcp(host, props.port("port")?)
    } else {
        return Err(props.error("missing host specification of the NBD server"));
    };

    let mut source = StorageSource::new_network(NetProtocol::Nbd);
    source.name = props.str("export")?.map(str::to_string);
    source.hosts.push(host);
    Ok(BackingSpec::secure(source))
}

fn sheepdog(props: Props<'_>) -> Result<BackingSpec> {
    if let Some(filename) = props.str("filename")? {
        return if filename.contains("://") {
            uri_for(&props, filename, NetProtocol::Sheepdog)
        } else {
            colon::parse(props.spec, filename)
        };
    }

    let vdi = props.required_str("vdi")?;
    let server = props
        .object("server")?
        .ok_or_else(|| props.error("missing 'server'"))?;

    let mut source = StorageSource::new_network(NetProtocol::Sheepdog);
    source.name = Some(vdi.to_string());
    source.snapshot = props
        .str("tag")?
        .filter(|tag| !tag.is_empty())
        .map(str::to_string);
    source.hosts.push(socket_address(&props.nested(server))?);
    Ok(BackingSpec::secure(source))
}

fn ssh(props: Props<'_>) -> Result<BackingSpec> {
    let path = props.required_str("path")?;
    let host = if let Some(server) = props.object("server")? {
        inet_address(&props.nested(server))?
    } else if let Some(host) = props.str("host")? {
        NetHost::tcp(host, props.port("port")?)
    } else {
        return Err(props.error("missing 'server' or 'host'"));
    };

    let mut source = StorageSource::new_network(NetProtocol::Ssh);
    source.name = Some(path.to_string());
    source.user = props.str("user")?.map(str::to_string);
    source.hosts.push(host);
    Ok(BackingSpec::secure(source))
}

fn rbd(props: Props<'_>) -> Result<BackingSpec> {
    if let Some(filename) = props.str("filename")? {
        let rest = filename.strip_prefix("rbd:").unwrap_or(filename);
        return colon::parse_rbd(props.spec, rest).map(BackingSpec::secure);
    }

    let pool = props.required_str("pool")?;
    let image = props.required_str("image")?;

    let mut source = StorageSource::new_network(NetProtocol::Rbd);
    source.name = Some(match props.str("namespace")? {
        Some(namespace) => format!("{pool}/{namespace}/{image}"),
        None => format!("{pool}/{image}"),
    });
    source.snapshot = props.str("snapshot")?.map(str::to_string);
    source.config_file = props.str("conf")?.map(str::to_string);
    source.user = props.str("user")?.map(str::to_string);
    for server in server_objects(&props)? {
        source.hosts.push(inet_address(&server)?);
    }
    Ok(BackingSpec::secure(source))
}

fn vxhs(props: Props<'_>) -> Result<BackingSpec> {
    let vdisk = props.required_str("vdisk-id")?;
    let server = props
        .object("server")?
        .ok_or_else(|| props.error("missing 'server'"))?;

    let mut source = StorageSource::new_network(NetProtocol::Vxhs);
    source.name = Some(vdisk.to_string());
    source.hosts.push(inet_address(&props.nested(server))?);
    Ok(BackingSpec::secure(source))
}

fn nfs(props: Props<'_>) -> Result<BackingSpec> {
    let path = props.required_str("path")?;
    let server = props
        .object("server")?
        .ok_or_else(|| props.error("missing 'server'"))?;

    let mut source = StorageSource::new_network(NetProtocol::Nfs);
    source.name = Some(path.to_string());
    source.hosts.push(socket_address(&props.nested(server))?);

    let user = props.number("user")?.map(|id| format!("+{id}"));
    let group = props.number("group")?.map(|id| format!("+{id}"));
    if user.is_some() || group.is_some() {
        source.nfs_identity = Some(NfsIdentity { user, group });
    }
    Ok(BackingSpec::secure(source))
}

fn nvme(props: Props<'_>) -> Result<BackingSpec> {
    let device = props.required_str("device")?;
    let address = parse_pci_address(device)
        .ok_or_else(|| props.error(format_args!("invalid PCI address '{device}'")))?;
    let namespace = props
        .number("namespace")?
        .ok_or_else(|| props.error("missing 'namespace'"))?;

    let mut source = StorageSource::new_network(NetProtocol::Nvme);
    source.kind = StorageKind::Nvme;
    source.nvme = Some(NvmeTarget { address, namespace });
    Ok(BackingSpec::secure(source))
}

/// `DDDD:BB:SS.F`, all hexadecimal.
fn parse_pci_address(device: &str) -> Option<PciAddress> {
    let (domain, rest) = device.split_once(':')?;
    let (bus, rest) = rest.split_once(':')?;
    let (slot, function) = rest.split_once('.')?;
    Some(PciAddress {
        domain: u16::from_str_radix(domain, 16).ok()?,
        bus: u8::from_str_radix(bus, 16).ok()?,
        slot: u8::from_str_radix(slot, 16).ok()?,
        function: u8::from_str_radix(function, 16).ok()?,
    })
}
