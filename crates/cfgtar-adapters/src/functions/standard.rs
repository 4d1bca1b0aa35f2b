//! The standard template function set: host facts, address arithmetic,
//! DNS lookups, file contents and duration conversion.
//!
//! Every host question goes through [`HostEnvironment`], so a
//! [`FixedEnvironment`](crate::environment::FixedEnvironment) makes the whole
//! set deterministic.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cfgtar_core::{
    application::{HostEnvironment, TemplateFunctions},
    domain::{Cidr, IpVersion, Value},
};

/// Names provided by [`StandardFunctions`].
pub const NAMES: &[&str] = &[
    "hostname",
    "ipv4CIDR",
    "ipv6CIDR",
    "ipv4Mask",
    "ipv6Mask",
    "ipv4addr",
    "ipv6addr",
    "ipv4addrRel",
    "ipv6addrRel",
    "file",
    "durationAs",
    "ipv4NICAddr",
    "ipv6NICAddr",
    "ipv4lookup",
    "ipv6lookup",
    "dnsTXT",
];

/// The standard function set backed by a host environment.
#[derive(Clone)]
pub struct StandardFunctions {
    env: Arc<dyn HostEnvironment>,
}

impl StandardFunctions {
    pub fn new(env: Arc<dyn HostEnvironment>) -> Self {
        Self { env }
    }
}

impl std::fmt::Debug for StandardFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardFunctions").finish_non_exhaustive()
    }
}

impl TemplateFunctions for StandardFunctions {
    fn has(&self, name: &str) -> bool {
        NAMES.contains(&name)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, String> {
        use IpVersion::{V4, V6};

        match name {
            "hostname" => {
                arity(args, 0)?;
                self.env.hostname().map(Value::from).map_err(|e| e.to_string())
            }
            "ipv4CIDR" => prefix_len(one(args)?, V4),
            "ipv6CIDR" => prefix_len(one(args)?, V6),
            "ipv4Mask" => netmask(one(args)?, V4),
            "ipv6Mask" => netmask(one(args)?, V6),
            "ipv4addr" => address(args, V4, false),
            "ipv6addr" => address(args, V6, false),
            "ipv4addrRel" => address(args, V4, true),
            "ipv6addrRel" => address(args, V6, true),
            "file" => {
                let path = one(args)?;
                self.env
                    .read_to_string(Path::new(&path))
                    .map(Value::from)
                    .map_err(|e| format!("{path}: {e}"))
            }
            "durationAs" => duration_as(args),
            "ipv4NICAddr" => self.nic_addresses(&one(args)?, V4),
            "ipv6NICAddr" => self.nic_addresses(&one(args)?, V6),
            "ipv4lookup" => self.lookup(&one(args)?, V4),
            "ipv6lookup" => self.lookup(&one(args)?, V6),
            "dnsTXT" => {
                let name = one(args)?;
                let records = self.env.resolve_txt(&name).map_err(|e| e.to_string())?;
                Ok(strings(records.into_iter()))
            }
            other => Err(format!("function \"{other}\" not defined")),
        }
    }
}

impl StandardFunctions {
    /// Interface addresses of one family in CIDR notation.
    fn nic_addresses(&self, nic: &str, version: IpVersion) -> Result<Value, String> {
        let addrs = self
            .env
            .interface_addresses(nic)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("no such network interface: {nic}"))?;
        Ok(strings(
            addrs
                .iter()
                .filter(|cidr| cidr.version() == version)
                .map(Cidr::to_string),
        ))
    }

    fn lookup(&self, host: &str, version: IpVersion) -> Result<Value, String> {
        let addrs = self.env.resolve(host).map_err(|e| e.to_string())?;
        Ok(strings(
            addrs
                .iter()
                .filter(|addr| version.matches(addr))
                .map(IpAddr::to_string),
        ))
    }
}

// ── argument helpers ─────────────────────────────────────────────────────────

fn wrong_count(want: &str, got: usize) -> String {
    format!("wrong number of args: want {want} got {got}")
}

fn arity(args: &[Value], want: usize) -> Result<(), String> {
    if args.len() != want {
        return Err(wrong_count(&want.to_string(), args.len()));
    }
    Ok(())
}

/// Scalars are accepted as their printed form.
fn text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_string()),
        other => Err(format!("expected a string argument, found {}", other.type_name())),
    }
}

fn one(args: &[Value]) -> Result<String, String> {
    arity(args, 1)?;
    text(&args[0])
}

fn strings(items: impl Iterator<Item = String>) -> Value {
    Value::Sequence(items.map(Value::String).collect())
}

// ── address arithmetic ───────────────────────────────────────────────────────

fn cidr(input: &str, version: IpVersion) -> Result<Cidr, String> {
    Cidr::parse_version(input, version).map_err(|e| e.to_string())
}

fn prefix_len(input: String, version: IpVersion) -> Result<Value, String> {
    Ok(Value::from(cidr(&input, version)?.prefix().to_string()))
}

fn netmask(input: String, version: IpVersion) -> Result<Value, String> {
    Ok(Value::from(cidr(&input, version)?.mask().to_string()))
}

/// `ipv4addr CIDR` yields the written address; `ipv4addr POS CIDR` picks a
/// position in the network. Relative forms count from the written address.
fn address(args: &[Value], version: IpVersion, relative: bool) -> Result<Value, String> {
    let (position, network) = match args {
        [network] => ("cur".to_owned(), text(network)?),
        [position, network] => {
            let position = text(position)?;
            let position = if relative { format!("+{position}") } else { position };
            (position, text(network)?)
        }
        _ => return Err(wrong_count("1 or 2", args.len())),
    };
    let net = cidr(&network, version)?;
    pick(&net, &position).map(|addr| Value::from(addr.to_string()))
}

/// Positions: `first`/`0`, `last`, `cur`/`current`/empty, or a number.
/// A leading `+` makes a number count from the written address instead of
/// the first one.
fn pick(net: &Cidr, position: &str) -> Result<IpAddr, String> {
    match position.to_ascii_lowercase().as_str() {
        "0" | "first" | "+0" | "+first" => return Ok(net.first()),
        "last" | "+last" => return Ok(net.last()),
        "" | "current" | "cur" | "+" | "+current" | "+cur" => return Ok(net.addr()),
        _ => {}
    }
    let (base, digits) = match position.strip_prefix('+') {
        Some(digits) => (net.addr(), digits),
        None => (net.first(), position),
    };
    let offset: u64 = digits
        .parse()
        .map_err(|_| format!("invalid address position {position:?}"))?;
    net.offset_from(base, u128::from(offset))
        .map_err(|_| format!("position {position} is outside {net}"))
}

// ── durations ────────────────────────────────────────────────────────────────

/// `durationAs D` is whole seconds; `durationAs UNIT D` uses `s`, `m` or `h`
/// (also `sec`, `second`, `min`, `minute`, `hour`). Fractions truncate.
fn duration_as(args: &[Value]) -> Result<Value, String> {
    let (unit, input) = match args {
        [input] => (Duration::from_secs(1), text(input)?),
        [unit, input] => {
            let unit = match text(unit)?.as_str() {
                "s" | "sec" | "second" => Duration::from_secs(1),
                "m" | "min" | "minute" => Duration::from_secs(60),
                "h" | "hour" => Duration::from_secs(3600),
                other => return Err(format!("unknown duration unit {other:?}, want h, m or s")),
            };
            (unit, text(input)?)
        }
        _ => return Err(wrong_count("1 or 2", args.len())),
    };
    let duration = humantime::parse_duration(&input).map_err(|e| format!("{input}: {e}"))?;
    let whole = duration.as_nanos() / unit.as_nanos();
    Ok(Value::from(whole.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedEnvironment;

    fn functions() -> StandardFunctions {
        let env = FixedEnvironment::new("node-7")
            .with_interface(
                "eth0",
                vec!["10.0.3.7/16".parse().unwrap(), "fd00::7/64".parse().unwrap()],
            )
            .with_host("db.internal", vec!["10.0.9.9".parse().unwrap(), "fd00::9".parse().unwrap()])
            .with_txt("_config.internal", vec!["role=edge".into(), "zone=b".into()])
            .with_file("/etc/motd", "hello\n");
        StandardFunctions::new(Arc::new(env))
    }

    fn call(name: &str, args: &[&str]) -> Result<Value, String> {
        let args: Vec<Value> = args.iter().map(|a| Value::from(*a)).collect();
        functions().call(name, &args)
    }

    fn s(name: &str, args: &[&str]) -> String {
        call(name, args).unwrap().to_string()
    }

    #[test]
    fn every_name_is_callable() {
        let f = functions();
        for name in NAMES {
            assert!(f.has(name), "{name}");
        }
        assert!(!f.has("dnsMX"));
    }

    #[test]
    fn host_facts() {
        assert_eq!(s("hostname", &[]), "node-7");
        assert_eq!(s("file", &["/etc/motd"]), "hello\n");
        assert!(call("file", &["/nope"]).is_err());
    }

    #[test]
    fn masks_and_prefixes() {
        assert_eq!(s("ipv4CIDR", &["10.0.3.7/16"]), "16");
        assert_eq!(s("ipv4Mask", &["10.0.3.7/16"]), "255.255.0.0");
        assert_eq!(s("ipv6CIDR", &["fd00::7/64"]), "64");
        assert_eq!(s("ipv6Mask", &["fd00::7/64"]), "ffff:ffff:ffff:ffff::");
        assert!(call("ipv4Mask", &["fd00::7/64"]).is_err());
    }

    #[test]
    fn address_positions() {
        let net = "192.168.1.77/24";
        assert_eq!(s("ipv4addr", &[net]), "192.168.1.77");
        assert_eq!(s("ipv4addr", &["first", net]), "192.168.1.0");
        assert_eq!(s("ipv4addr", &["LAST", net]), "192.168.1.255");
        assert_eq!(s("ipv4addr", &["10", net]), "192.168.1.10");
        assert_eq!(s("ipv4addrRel", &["3", net]), "192.168.1.80");
        assert!(call("ipv4addr", &["256", net]).is_err());
        assert!(call("ipv4addrRel", &["200", net]).is_err());
        assert!(call("ipv4addr", &["soon", net]).is_err());
        assert_eq!(s("ipv6addr", &["1", "fd00::7/64"]), "fd00::1");
    }

    #[test]
    fn numeric_positions_are_accepted() {
        let out = functions()
            .call("ipv4addr", &[Value::Int(2), Value::from("10.1.0.0/16")])
            .unwrap();
        assert_eq!(out, Value::from("10.1.0.2"));
    }

    #[test]
    fn durations() {
        assert_eq!(s("durationAs", &["90s"]), "90");
        assert_eq!(s("durationAs", &["m", "90s"]), "1");
        assert_eq!(s("durationAs", &["hour", "3h 59m"]), "3");
        assert!(call("durationAs", &["d", "1h"]).is_err());
        assert!(call("durationAs", &["later"]).is_err());
    }

    #[test]
    fn interfaces_and_lookups_filter_by_family() {
        assert_eq!(s("ipv4NICAddr", &["eth0"]), "[10.0.3.7/16]");
        assert_eq!(s("ipv6NICAddr", &["eth0"]), "[fd00::7/64]");
        assert!(call("ipv4NICAddr", &["wlan9"]).is_err());
        assert_eq!(s("ipv4lookup", &["db.internal"]), "[10.0.9.9]");
        assert_eq!(s("ipv6lookup", &["db.internal"]), "[fd00::9]");
        assert!(call("ipv4lookup", &["nowhere"]).is_err());
    }

    #[test]
    fn txt_records_are_a_list_of_strings() {
        assert_eq!(
            call("dnsTXT", &["_config.internal"]).unwrap(),
            Value::Sequence(vec![Value::from("role=edge"), Value::from("zone=b")])
        );
        assert!(call("dnsTXT", &["nowhere"]).is_err());
        assert!(call("dnsTXT", &[]).is_err());
    }

    #[test]
    fn arity_is_checked() {
        assert!(call("hostname", &["x"]).is_err());
        assert!(call("ipv4addr", &[]).is_err());
        assert!(call("ipv4CIDR", &["a", "b"]).is_err());
    }
}
