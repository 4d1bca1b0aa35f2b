//! Built-in leaf validators.
//!
//! Pure validators are plain functions; validators that query the host are
//! constructors returning a closure over the [`HostEnvironment`]. Every one
//! of them can be registered on its own under any name.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::sync::Arc;

use ::base64::Engine as _;

use crate::domain::{
    environment::{HostEnvironment, PathKind},
    error::DomainError,
    net::{Cidr, IpVersion},
    schema::params::{ParamMap, check_length},
    value::Value,
};

fn expect_str<'a>(value: &'a Value, expected: &str) -> Result<&'a str, DomainError> {
    value
        .as_str()
        .ok_or_else(|| DomainError::type_violation(expected, value))
}

fn malformed(expected: &str, text: &str) -> DomainError {
    DomainError::TypeViolation {
        expected: expected.to_owned(),
        found: format!("{text:?}"),
    }
}

// ── scalars ──────────────────────────────────────────────────────────────────

/// Non-empty string; `min`/`max`/`len` bound its byte length and are
/// checked first.
pub fn string(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "string")?;
    check_length(params, s.len())?;
    if s.is_empty() {
        return Err(malformed("non-empty string", s));
    }
    Ok(value.clone())
}

/// Any number, normalized to a float; `min`/`max` bound it.
pub fn float(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let n = value
        .as_f64()
        .ok_or_else(|| DomainError::type_violation("float", value))?;
    if let Some(min) = params.float("min")? {
        if n < min {
            return Err(DomainError::constraint("min", format!("{n} is below {min}")));
        }
    }
    if let Some(max) = params.float("max")? {
        if n > max {
            return Err(DomainError::constraint("max", format!("{n} exceeds {max}")));
        }
    }
    Ok(Value::Float(n))
}

/// Integral-valued number, normalized to an int; `min`/`max` bound it.
pub fn int(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let n = match value {
        Value::Int(i) => *i,
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            *f as i64
        }
        Value::Float(f) => return Err(malformed("int", &f.to_string())),
        other => return Err(DomainError::type_violation("int", other)),
    };
    if let Some(min) = params.int("min")? {
        if n < min {
            return Err(DomainError::constraint("min", format!("{n} is below {min}")));
        }
    }
    if let Some(max) = params.int("max")? {
        if n > max {
            return Err(DomainError::constraint("max", format!("{n} exceeds {max}")));
        }
    }
    Ok(Value::Int(n))
}

/// Human-readable duration (`90s`, `1h 30m`); `min`/`max` are durations.
pub fn duration(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "duration")?;
    let d = humantime::parse_duration(s).map_err(|_| malformed("duration", s))?;
    if let Some(min) = params.duration("min")? {
        if d < min {
            return Err(DomainError::constraint("min", format!("{s} is shorter than {min:?}")));
        }
    }
    if let Some(max) = params.duration("max")? {
        if d > max {
            return Err(DomainError::constraint("max", format!("{s} is longer than {max:?}")));
        }
    }
    Ok(value.clone())
}

// ── encodings ────────────────────────────────────────────────────────────────

/// Hex bytes with an optional `x`/`0x` prefix; bounds apply to the decoded length.
pub fn hex(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "hex")?;
    let digits = ["0x", "0X", "x", "X"]
        .iter()
        .find_map(|prefix| s.strip_prefix(prefix))
        .unwrap_or(s);
    let bytes = ::hex::decode(digits).map_err(|_| malformed("hex", s))?;
    check_length(params, bytes.len())?;
    Ok(value.clone())
}

/// Standard base64; bounds apply to the decoded length.
pub fn base64(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "base64")?;
    let bytes = ::base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|_| malformed("base64", s))?;
    check_length(params, bytes.len())?;
    Ok(value.clone())
}

/// Bitcoin-alphabet base58; bounds apply to the decoded length.
pub fn base58(value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "base58")?;
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|_| malformed("base58", s))?;
    check_length(params, bytes.len())?;
    Ok(value.clone())
}

// ── addresses ────────────────────────────────────────────────────────────────

pub fn ipv4(value: &Value, _params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "ipv4")?;
    s.parse::<Ipv4Addr>().map_err(|_| malformed("ipv4", s))?;
    Ok(value.clone())
}

/// IPv6 literal; IPv4-mapped addresses count as IPv4 and are rejected.
pub fn ipv6(value: &Value, _params: &ParamMap) -> Result<Value, DomainError> {
    let s = expect_str(value, "ipv6")?;
    match s.parse::<Ipv6Addr>() {
        Ok(addr) if addr.to_ipv4_mapped().is_none() => Ok(value.clone()),
        _ => Err(malformed("ipv6", s)),
    }
}

/// IPv4 CIDR literal; yields the host address.
pub fn ipv4net(value: &Value, _params: &ParamMap) -> Result<Value, DomainError> {
    cidr_host(value, IpVersion::V4)
}

/// IPv6 CIDR literal; yields the host address.
pub fn ipv6net(value: &Value, _params: &ParamMap) -> Result<Value, DomainError> {
    cidr_host(value, IpVersion::V6)
}

fn cidr_host(value: &Value, version: IpVersion) -> Result<Value, DomainError> {
    let expected = format!("{version}net");
    let s = expect_str(value, &expected)?;
    let cidr = Cidr::parse_version(s, version).map_err(|_| malformed(&expected, s))?;
    Ok(Value::String(cidr.addr().to_string()))
}

// ── host-dependent ───────────────────────────────────────────────────────────

/// Path that exists and is of `kind` (`dir` / `file`).
pub fn path_of_kind(
    env: Arc<dyn HostEnvironment>,
    kind: PathKind,
) -> impl Fn(&Value, &ParamMap) -> Result<Value, DomainError> + Send + Sync {
    let type_name = match kind {
        PathKind::Directory => "dir",
        PathKind::File => "file",
        PathKind::Other => "path",
    };
    move |value, _params| {
        let s = expect_str(value, type_name)?;
        match env.path_kind(Path::new(s)) {
            Some(found) if found == kind => Ok(value.clone()),
            Some(_) => Err(DomainError::constraint(type_name, format!("'{s}' is not a {type_name}"))),
            None => Err(DomainError::constraint(type_name, format!("'{s}' does not exist"))),
        }
    }
}

/// Must equal the running machine's host name (ASCII case-insensitive).
pub fn hostname(
    env: Arc<dyn HostEnvironment>,
) -> impl Fn(&Value, &ParamMap) -> Result<Value, DomainError> + Send + Sync {
    move |value, _params| {
        let s = expect_str(value, "hostname")?;
        let actual = env.hostname().map_err(|e| {
            DomainError::constraint("hostname", format!("cannot determine host name: {e}"))
        })?;
        if !s.eq_ignore_ascii_case(&actual) {
            return Err(DomainError::constraint(
                "hostname",
                format!("'{s}' is not this machine ({actual})"),
            ));
        }
        Ok(value.clone())
    }
}

/// Existing network interface, optionally carrying an address of `version`.
pub fn nic(
    env: Arc<dyn HostEnvironment>,
    version: Option<IpVersion>,
) -> impl Fn(&Value, &ParamMap) -> Result<Value, DomainError> + Send + Sync {
    let type_name = match version {
        None => "nic",
        Some(IpVersion::V4) => "nic4",
        Some(IpVersion::V6) => "nic6",
    };
    move |value, _params| {
        let s = expect_str(value, type_name)?;
        let addrs = env
            .interface_addresses(s)
            .map_err(|e| DomainError::constraint(type_name, format!("cannot list interfaces: {e}")))?
            .ok_or_else(|| DomainError::constraint(type_name, format!("no interface named '{s}'")))?;
        if let Some(version) = version {
            if !addrs.iter().any(|cidr| cidr.version() == version) {
                return Err(DomainError::constraint(
                    type_name,
                    format!("interface '{s}' has no {version} address"),
                ));
            }
        }
        Ok(value.clone())
    }
}

/// Host name that resolves to at least one address of `version`.
pub fn lookup(
    env: Arc<dyn HostEnvironment>,
    version: IpVersion,
) -> impl Fn(&Value, &ParamMap) -> Result<Value, DomainError> + Send + Sync {
    let type_name = match version {
        IpVersion::V4 => "lookup4",
        IpVersion::V6 => "lookup6",
    };
    move |value, _params| {
        let s = expect_str(value, type_name)?;
        let addrs = env
            .resolve(s)
            .map_err(|e| DomainError::constraint(type_name, format!("cannot resolve '{s}': {e}")))?;
        if !addrs.iter().any(|addr| version.matches(addr)) {
            return Err(DomainError::constraint(
                type_name,
                format!("'{s}' has no {version} address"),
            ));
        }
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::IpAddr;

    use super::*;
    use crate::domain::ErrorKind;
    use crate::domain::environment::MockHostEnvironment;

    fn no_params() -> ParamMap {
        ParamMap::new()
    }

    fn kind_of(result: Result<Value, DomainError>) -> ErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn string_bounds() {
        let params = ParamMap::parse("min=2,max=4");
        assert!(string(&"abc".into(), &params).is_ok());
        assert_eq!(kind_of(string(&"a".into(), &params)), ErrorKind::ParamConstraint);
        assert_eq!(kind_of(string(&"abcde".into(), &params)), ErrorKind::ParamConstraint);
        assert_eq!(kind_of(string(&"".into(), &no_params())), ErrorKind::StructuralViolation);
        assert_eq!(kind_of(string(&Value::Int(1), &no_params())), ErrorKind::StructuralViolation);
    }

    #[test]
    fn string_bounds_come_before_emptiness() {
        assert_eq!(
            kind_of(string(&"".into(), &ParamMap::parse("min=1"))),
            ErrorKind::ParamConstraint
        );
        assert_eq!(
            kind_of(string(&"".into(), &ParamMap::parse("min"))),
            ErrorKind::StructuralViolation
        );
        assert!(string(&"abc".into(), &ParamMap::parse("min")).is_ok());
        assert_eq!(
            kind_of(string(&"abc".into(), &ParamMap::parse("max"))),
            ErrorKind::ParamConstraint
        );
    }

    #[test]
    fn int_accepts_integral_floats_only() {
        assert_eq!(int(&Value::Float(3.0), &no_params()).unwrap(), Value::Int(3));
        assert_eq!(kind_of(int(&Value::Float(3.5), &no_params())), ErrorKind::StructuralViolation);
        assert_eq!(kind_of(int(&"3".into(), &no_params())), ErrorKind::StructuralViolation);
    }

    #[test]
    fn int_bounds_and_bad_params() {
        let params = ParamMap::parse("min=1,max=65535");
        assert_eq!(kind_of(int(&Value::Int(70000), &params)), ErrorKind::ParamConstraint);
        assert_eq!(kind_of(int(&Value::Int(0), &params)), ErrorKind::ParamConstraint);
        assert_eq!(
            kind_of(int(&Value::Int(5), &ParamMap::parse("min=1.5"))),
            ErrorKind::ParamType
        );
    }

    #[test]
    fn float_normalizes_ints() {
        assert_eq!(float(&Value::Int(2), &no_params()).unwrap(), Value::Float(2.0));
        assert_eq!(
            kind_of(float(&Value::Float(0.5), &ParamMap::parse("min=1"))),
            ErrorKind::ParamConstraint
        );
    }

    #[test]
    fn duration_bounds() {
        let params = ParamMap::parse("min=1s,max=1h");
        assert!(duration(&"30m".into(), &params).is_ok());
        assert_eq!(kind_of(duration(&"2h".into(), &params)), ErrorKind::ParamConstraint);
        assert_eq!(kind_of(duration(&"soon".into(), &params)), ErrorKind::StructuralViolation);
        assert_eq!(
            kind_of(duration(&"5s".into(), &ParamMap::parse("max=later"))),
            ErrorKind::ParamType
        );
    }

    #[test]
    fn hex_tolerates_prefixes() {
        assert!(hex(&"0xdeadbeef".into(), &ParamMap::parse("len=4")).is_ok());
        assert!(hex(&"xdead".into(), &no_params()).is_ok());
        assert_eq!(kind_of(hex(&"0xabc".into(), &no_params())), ErrorKind::StructuralViolation);
        assert_eq!(
            kind_of(hex(&"abcd".into(), &ParamMap::parse("min=3"))),
            ErrorKind::ParamConstraint
        );
    }

    #[test]
    fn base64_and_base58() {
        assert!(base64(&"aGVsbG8=".into(), &ParamMap::parse("len=5")).is_ok());
        assert_eq!(kind_of(base64(&"***".into(), &no_params())), ErrorKind::StructuralViolation);
        assert!(base58(&"Cn8eVZg".into(), &ParamMap::parse("len=5")).is_ok());
        assert_eq!(kind_of(base58(&"0OIl".into(), &no_params())), ErrorKind::StructuralViolation);
    }

    #[test]
    fn ip_literals() {
        assert!(ipv4(&"10.0.0.1".into(), &no_params()).is_ok());
        assert!(ipv4(&"::1".into(), &no_params()).is_err());
        assert!(ipv6(&"fe80::1".into(), &no_params()).is_ok());
        assert!(ipv6(&"::ffff:10.0.0.1".into(), &no_params()).is_err());
    }

    #[test]
    fn cidr_returns_host_address() {
        assert_eq!(
            ipv4net(&"192.168.1.2/24".into(), &no_params()).unwrap(),
            Value::from("192.168.1.2")
        );
        assert_eq!(
            ipv6net(&"2001:db8::7/64".into(), &no_params()).unwrap(),
            Value::from("2001:db8::7")
        );
        assert!(ipv4net(&"2001:db8::7/64".into(), &no_params()).is_err());
    }

    #[test]
    fn hostname_compares_with_environment() {
        let mut env = MockHostEnvironment::new();
        env.expect_hostname().returning(|| Ok("aristotle".into()));
        let check = hostname(Arc::new(env));
        assert!(check(&"Aristotle".into(), &no_params()).is_ok());
        assert_eq!(kind_of(check(&"plato".into(), &no_params())), ErrorKind::ParamConstraint);
    }

    #[test]
    fn nic_requires_matching_address_family() {
        let mut env = MockHostEnvironment::new();
        env.expect_interface_addresses().returning(|name| match name {
            "eth0" => Ok(Some(vec!["10.0.0.2/24".parse().unwrap()])),
            _ => Ok(None),
        });
        let env: Arc<dyn HostEnvironment> = Arc::new(env);

        assert!(nic(env.clone(), None)(&"eth0".into(), &no_params()).is_ok());
        assert!(nic(env.clone(), Some(IpVersion::V4))(&"eth0".into(), &no_params()).is_ok());
        assert!(nic(env.clone(), Some(IpVersion::V6))(&"eth0".into(), &no_params()).is_err());
        assert!(nic(env, None)(&"wlan9".into(), &no_params()).is_err());
    }

    #[test]
    fn lookup_checks_address_family() {
        let mut env = MockHostEnvironment::new();
        env.expect_resolve().returning(|host| match host {
            "v4.example" => Ok(vec![IpAddr::from([192, 0, 2, 1])]),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such host")),
        });
        let env: Arc<dyn HostEnvironment> = Arc::new(env);

        assert!(lookup(env.clone(), IpVersion::V4)(&"v4.example".into(), &no_params()).is_ok());
        assert!(lookup(env.clone(), IpVersion::V6)(&"v4.example".into(), &no_params()).is_err());
        assert!(lookup(env, IpVersion::V4)(&"nowhere".into(), &no_params()).is_err());
    }

    #[test]
    fn dir_and_file_use_path_kind() {
        let mut env = MockHostEnvironment::new();
        env.expect_path_kind().returning(|path| match path.to_str() {
            Some("/etc") => Some(PathKind::Directory),
            Some("/etc/hosts") => Some(PathKind::File),
            _ => None,
        });
        let env: Arc<dyn HostEnvironment> = Arc::new(env);
        let dir = path_of_kind(env.clone(), PathKind::Directory);
        let file = path_of_kind(env, PathKind::File);

        assert!(dir(&"/etc".into(), &no_params()).is_ok());
        assert!(dir(&"/etc/hosts".into(), &no_params()).is_err());
        assert!(file(&"/etc/hosts".into(), &no_params()).is_ok());
        assert_eq!(kind_of(file(&"/nope".into(), &no_params())), ErrorKind::ParamConstraint);
    }
}
