// Reader for nmap's `-oX` output. nmap writes a flat, attribute-heavy
// document, so element attributes are pulled out with regexes rather than
// a full XML parser.
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::error::{Result, ScanError};
use crate::scanner::results::{HostResult, Hostname, OsMatch, PortEntry, RunInfo, ServiceInfo};

lazy_static::lazy_static! {
    static ref NMAPRUN: Regex = Regex::new(r"<nmaprun\b([^>]*)>").unwrap();
    static ref FINISHED: Regex = Regex::new(r"<finished\b([^>]*)>").unwrap();
    static ref HOST: Regex = Regex::new(r"(?s)<host\b[^>]*>(.*?)</host>").unwrap();
    static ref STATUS: Regex = Regex::new(r"<status\b([^>]*)>").unwrap();
    static ref ADDRESS: Regex = Regex::new(r"<address\b([^>]*)>").unwrap();
    static ref HOSTNAME: Regex = Regex::new(r"<hostname\b([^>]*)>").unwrap();
    static ref PORT: Regex = Regex::new(r"(?s)<port\b([^>]*)>(.*?)</port>").unwrap();
    static ref STATE: Regex = Regex::new(r"<state\b([^>]*)>").unwrap();
    static ref SERVICE: Regex = Regex::new(r"<service\b([^>]*)>").unwrap();
    static ref OSMATCH: Regex = Regex::new(r"<osmatch\b([^>]*)>").unwrap();
    static ref ATTRIBUTE: Regex = Regex::new(r#"([\w:-]+)="([^"]*)""#).unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#x[0-9a-fA-F]+);").unwrap();
}

/// Parsed `-oX` document.
#[derive(Debug, Clone, Default)]
pub struct NmapRun {
    pub run: RunInfo,
    pub hosts: Vec<HostResult>,
}

pub fn parse_nmap_xml(xml: &str) -> Result<NmapRun> {
    let root = NMAPRUN
        .captures(xml)
        .ok_or_else(|| ScanError::InvalidXml("missing <nmaprun> element".to_string()))?;
    if !xml.contains("</nmaprun>") {
        return Err(ScanError::InvalidXml("truncated <nmaprun> document".to_string()));
    }
    let root_attrs = attributes(&root[1]);

    let mut run = RunInfo {
        nmap_version: root_attrs.get("version").cloned(),
        command_line: root_attrs.get("args").cloned(),
        ..RunInfo::default()
    };
    if let Some(finished) = FINISHED.captures(xml) {
        let attrs = attributes(&finished[1]);
        run.elapsed_secs = attrs.get("elapsed").and_then(|e| e.parse().ok());
        run.summary = attrs.get("summary").cloned();
    }

    let mut hosts: Vec<HostResult> = HOST
        .captures_iter(xml)
        .filter_map(|cap| parse_host(&cap[1]))
        .collect();

    hosts.sort_by_key(|host| {
        let ip = host.address.parse::<IpAddr>().ok();
        (ip.is_none(), ip, host.address.clone())
    });

    Ok(NmapRun { run, hosts })
}

fn parse_host(body: &str) -> Option<HostResult> {
    let addresses: Vec<HashMap<String, String>> = ADDRESS
        .captures_iter(body)
        .map(|cap| attributes(&cap[1]))
        .collect();
    let address = addresses
        .iter()
        .find(|a| matches!(a.get("addrtype").map(String::as_str), Some("ipv4") | Some("ipv6")))
        .or_else(|| addresses.first())
        .and_then(|a| a.get("addr").cloned())?;

    let state = STATUS
        .captures(body)
        .and_then(|cap| attributes(&cap[1]).remove("state"))
        .unwrap_or_else(|| "unknown".to_string());

    let mut host = HostResult::new(address, state);

    host.hostnames = HOSTNAME
        .captures_iter(body)
        .map(|cap| {
            let mut attrs = attributes(&cap[1]);
            Hostname {
                name: attrs.remove("name").unwrap_or_default(),
                kind: attrs.remove("type").unwrap_or_default(),
            }
        })
        .collect();

    for cap in PORT.captures_iter(body) {
        if let Some(entry) = parse_port(&cap) {
            host.protocols.entry(entry.protocol.clone()).or_default().push(entry);
        }
    }
    for ports in host.protocols.values_mut() {
        ports.sort_by_key(|p| p.port);
    }

    host.os_matches = OSMATCH
        .captures_iter(body)
        .map(|cap| {
            let mut attrs = attributes(&cap[1]);
            OsMatch {
                name: attrs.remove("name").unwrap_or_else(|| "Unknown OS".to_string()),
                accuracy: attrs.get("accuracy").and_then(|a| a.parse().ok()),
            }
        })
        .collect();

    Some(host)
}

fn parse_port(cap: &Captures) -> Option<PortEntry> {
    let mut attrs = attributes(&cap[1]);
    let port = attrs.get("portid")?.parse().ok()?;
    let protocol = attrs.remove("protocol").unwrap_or_else(|| "tcp".to_string());
    let body = &cap[2];

    let state = STATE
        .captures(body)
        .and_then(|c| attributes(&c[1]).remove("state"))
        .unwrap_or_else(|| "unknown".to_string());

    let service = SERVICE.captures(body).map(|c| {
        let mut attrs = attributes(&c[1]);
        ServiceInfo {
            name: attrs.remove("name").unwrap_or_default(),
            product: attrs.remove("product").filter(|s| !s.is_empty()),
            version: attrs.remove("version").filter(|s| !s.is_empty()),
            extra_info: attrs.remove("extrainfo").filter(|s| !s.is_empty()),
        }
    });

    Some(PortEntry { port, protocol, state, service })
}

fn attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|cap| (cap[1].to_string(), unescape(&cap[2])))
        .collect()
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    ENTITY
        .replace_all(value, |cap: &Captures| {
            let decoded = match &cap[1] {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                num => {
                    let (digits, radix) = match num.strip_prefix("#x") {
                        Some(hex) => (hex, 16),
                        None => (&num[1..], 10),
                    };
                    u32::from_str_radix(digits, radix).ok().and_then(char::from_u32)
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -oX - -T4 -A -v 192.168.1.0/30" start="1700000000" version="7.94" xmloutputversion="1.05">
<scaninfo type="syn" protocol="tcp" numservices="1000" services="1-1000"/>
<host starttime="1700000001" endtime="1700000009"><status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="192.168.1.10" addrtype="ipv4"/>
<address addr="AA:BB:CC:DD:EE:FF" addrtype="mac" vendor="Acme"/>
<hostnames>
<hostname name="nas.local" type="PTR"/>
</hostnames>
<ports><extraports state="closed" count="997"/>
<port protocol="tcp" portid="443"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="https" product="nginx" version="1.24.0" method="probed" conf="10"/></port>
<port protocol="tcp" portid="22"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="ssh" product="OpenSSH" version="9.6p1 Ubuntu 3ubuntu13" extrainfo="Ubuntu Linux; protocol 2.0" method="probed" conf="10"/></port>
<port protocol="udp" portid="53"><state state="open|filtered" reason="no-response" reason_ttl="0"/><service name="domain" method="table" conf="3"/></port>
</ports>
<os><osmatch name="Linux 5.0 - 5.14" accuracy="98" line="67000"><osclass type="general purpose" vendor="Linux" osfamily="Linux" osgen="5.X" accuracy="98"/></osmatch>
<osmatch name="MikroTik RouterOS 7.2 &amp; later" accuracy="91" line="88000"/></os>
</host>
<host><status state="up" reason="localhost-response" reason_ttl="0"/>
<address addr="192.168.1.2" addrtype="ipv4"/>
<hostnames>
</hostnames>
</host>
<runstats><finished time="1700000010" timestr="Tue Nov 14 22:13:30 2023" summary="Nmap done at Tue Nov 14 22:13:30 2023; 4 IP addresses (2 hosts up) scanned in 9.87 seconds" elapsed="9.87" exit="success"/><hosts up="2" down="2" total="4"/>
</runstats>
</nmaprun>
"#;

    #[test]
    fn test_run_metadata() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        assert_eq!(parsed.run.nmap_version.as_deref(), Some("7.94"));
        assert_eq!(parsed.run.command_line.as_deref(), Some("nmap -oX - -T4 -A -v 192.168.1.0/30"));
        assert_eq!(parsed.run.elapsed_secs, Some(9.87));
        assert!(parsed.run.summary.unwrap().contains("2 hosts up"));
    }

    #[test]
    fn test_hosts_sorted_numerically() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        let addrs: Vec<_> = parsed.hosts.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(addrs, vec!["192.168.1.2", "192.168.1.10"]);
    }

    #[test]
    fn test_ip_address_preferred_over_mac() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        assert!(parsed.hosts.iter().all(|h| !h.address.contains(':')));
    }

    #[test]
    fn test_ports_grouped_and_sorted() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        let host = &parsed.hosts[1];
        assert_eq!(host.state, "up");
        assert_eq!(host.named_hostnames(), vec!["nas.local"]);

        let protocols: Vec<_> = host.protocols.keys().map(String::as_str).collect();
        assert_eq!(protocols, vec!["tcp", "udp"]);

        let tcp = &host.protocols["tcp"];
        assert_eq!(tcp.iter().map(|p| p.port).collect::<Vec<_>>(), vec![22, 443]);
        let ssh = tcp[0].service.as_ref().unwrap();
        assert_eq!(ssh.name, "ssh");
        assert_eq!(ssh.product.as_deref(), Some("OpenSSH"));
        assert_eq!(ssh.version.as_deref(), Some("9.6p1 Ubuntu 3ubuntu13"));
        assert_eq!(ssh.extra_info.as_deref(), Some("Ubuntu Linux; protocol 2.0"));

        let udp = &host.protocols["udp"][0];
        assert_eq!(udp.state, "open|filtered");
        assert_eq!(udp.service.as_ref().unwrap().product, None);
    }

    #[test]
    fn test_os_matches_and_entities() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        let host = &parsed.hosts[1];
        assert_eq!(host.os_matches.len(), 2);
        assert_eq!(host.os_matches[0].name, "Linux 5.0 - 5.14");
        assert_eq!(host.os_matches[0].accuracy, Some(98));
        assert_eq!(host.os_matches[1].name, "MikroTik RouterOS 7.2 & later");
    }

    #[test]
    fn test_host_without_ports() {
        let parsed = parse_nmap_xml(SAMPLE).unwrap();
        let host = &parsed.hosts[0];
        assert!(host.protocols.is_empty());
        assert!(host.hostnames.is_empty());
        assert!(host.os_matches.is_empty());
    }

    #[test]
    fn test_empty_run() {
        let xml = r#"<nmaprun scanner="nmap" version="7.94"><runstats><finished elapsed="0.51"/><hosts up="0" down="1" total="1"/></runstats></nmaprun>"#;
        let parsed = parse_nmap_xml(xml).unwrap();
        assert!(parsed.hosts.is_empty());
    }

    #[test]
    fn test_rejects_non_xml() {
        let err = parse_nmap_xml("Starting Nmap 7.94").unwrap_err();
        assert!(matches!(err, ScanError::InvalidXml(_)));
    }

    #[test]
    fn test_truncated_document_rejected() {
        let err = parse_nmap_xml("<nmaprun scanner=\"nmap\" version=\"7.94\">\n<host>").unwrap_err();
        assert!(matches!(err, ScanError::InvalidXml(_)));
    }

    #[test]
    fn test_numeric_char_refs() {
        assert_eq!(unescape("a&#xa;b&#65;"), "a\nbA");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_entities_decoded_once() {
        assert_eq!(unescape("&#38;lt;"), "&lt;");
        assert_eq!(unescape("&#x26;amp;"), "&amp;");
        assert_eq!(unescape("&quot;a&quot; &apos;b&apos; 1 &gt; 0"), "\"a\" 'b' 1 > 0");
        assert_eq!(unescape("&#xFFFFFF; &bogus;"), "&#xFFFFFF; &bogus;");
    }
}
