// Namespace table rows and the columns they can be sorted by

use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::stats::IoRates;

/// One display row: namespace identity plus rates computed at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRow {
    pub nsid: u32,
    pub bdev_name: String,
    pub rbd_image: String,
    pub rates: IoRates,
    pub load_balancing_group: u32,
    pub qos_enabled: bool,
}

impl NamespaceRow {
    pub fn read_mib_per_sec(&self) -> f64 {
        bytes_to_mib(self.rates.read.bytes_per_sec)
    }

    pub fn write_mib_per_sec(&self) -> f64 {
        bytes_to_mib(self.rates.write.bytes_per_sec)
    }
}

fn bytes_to_mib(bytes: f64) -> f64 {
    bytes / 1024.0 / 1024.0
}

/// Namespace table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Nsid,
    RbdImage,
    ReadOps,
    ReadMib,
    ReadAwait,
    ReadRequestSize,
    WriteOps,
    WriteMib,
    WriteAwait,
    WriteRequestSize,
    LoadBalancingGroup,
    Qos,
}

impl SortKey {
    pub const ALL: [SortKey; 12] = [
        SortKey::Nsid,
        SortKey::RbdImage,
        SortKey::ReadOps,
        SortKey::ReadMib,
        SortKey::ReadAwait,
        SortKey::ReadRequestSize,
        SortKey::WriteOps,
        SortKey::WriteMib,
        SortKey::WriteAwait,
        SortKey::WriteRequestSize,
        SortKey::LoadBalancingGroup,
        SortKey::Qos,
    ];

    /// Column heading as printed in the namespace table.
    pub fn heading(self) -> &'static str {
        match self {
            SortKey::Nsid => "NSID",
            SortKey::RbdImage => "RBD pool/image",
            SortKey::ReadOps => "r/s",
            SortKey::ReadMib => "rMB/s",
            SortKey::ReadAwait => "r_await",
            SortKey::ReadRequestSize => "rareq-sz",
            SortKey::WriteOps => "w/s",
            SortKey::WriteMib => "wMB/s",
            SortKey::WriteAwait => "w_await",
            SortKey::WriteRequestSize => "wareq-sz",
            SortKey::LoadBalancingGroup => "LBGrp",
            SortKey::Qos => "QoS",
        }
    }

    /// Compares the typed column values; numeric columns never go through their display text.
    pub fn compare(self, a: &NamespaceRow, b: &NamespaceRow) -> Ordering {
        let (ar, br) = (&a.rates, &b.rates);
        match self {
            SortKey::Nsid => a.nsid.cmp(&b.nsid),
            SortKey::RbdImage => a.rbd_image.cmp(&b.rbd_image),
            SortKey::ReadOps => ar.read.ops_per_sec.total_cmp(&br.read.ops_per_sec),
            SortKey::ReadMib => ar.read.bytes_per_sec.total_cmp(&br.read.bytes_per_sec),
            SortKey::ReadAwait => ar.read.avg_wait_ms.total_cmp(&br.read.avg_wait_ms),
            SortKey::ReadRequestSize => ar
                .read
                .avg_request_kib
                .total_cmp(&br.read.avg_request_kib),
            SortKey::WriteOps => ar.write.ops_per_sec.total_cmp(&br.write.ops_per_sec),
            SortKey::WriteMib => ar.write.bytes_per_sec.total_cmp(&br.write.bytes_per_sec),
            SortKey::WriteAwait => ar.write.avg_wait_ms.total_cmp(&br.write.avg_wait_ms),
            SortKey::WriteRequestSize => ar
                .write
                .avg_request_kib
                .total_cmp(&br.write.avg_request_kib),
            SortKey::LoadBalancingGroup => a.load_balancing_group.cmp(&b.load_balancing_group),
            SortKey::Qos => a.qos_enabled.cmp(&b.qos_enabled),
        }
    }

    /// Sorts rows by this column; ties fall back to ascending nsid.
    pub fn sort(self, rows: &mut [NamespaceRow], descending: bool) {
        rows.sort_by(|a, b| {
            let ord = self.compare(a, b);
            let ord = if descending { ord.reverse() } else { ord };
            ord.then_with(|| a.nsid.cmp(&b.nsid))
        });
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.heading())
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// Accepts a column heading, case-insensitively (e.g. "r_await", "nsid").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|k| k.heading().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = SortKey::ALL.iter().map(|k| k.heading()).collect();
                format!("unknown sort key '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DirectionRates;

    fn row(nsid: u32, read_ops: f64, image: &str) -> NamespaceRow {
        NamespaceRow {
            nsid,
            bdev_name: format!("bdev_{nsid}"),
            rbd_image: image.to_string(),
            rates: IoRates {
                read: DirectionRates {
                    ops_per_sec: read_ops,
                    ..Default::default()
                },
                ..Default::default()
            },
            load_balancing_group: 0,
            qos_enabled: false,
        }
    }

    #[test]
    fn numeric_columns_sort_numerically_not_lexically() {
        let mut rows = vec![row(1, 9.0, "a"), row(2, 10.0, "b"), row(3, 100.0, "c")];
        SortKey::ReadOps.sort(&mut rows, true);
        let order: Vec<u32> = rows.iter().map(|r| r.nsid).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn text_column_sorts_lexically() {
        let mut rows = vec![row(1, 0.0, "rbd/b"), row(2, 0.0, "rbd/a")];
        SortKey::RbdImage.sort(&mut rows, false);
        assert_eq!(rows[0].nsid, 2);
    }

    #[test]
    fn ties_break_on_nsid() {
        let mut rows = vec![row(3, 1.0, "x"), row(1, 1.0, "x"), row(2, 1.0, "x")];
        SortKey::ReadOps.sort(&mut rows, true);
        let order: Vec<u32> = rows.iter().map(|r| r.nsid).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn parses_headings_case_insensitively() {
        assert_eq!("nsid".parse::<SortKey>().unwrap(), SortKey::Nsid);
        assert_eq!("R_AWAIT".parse::<SortKey>().unwrap(), SortKey::ReadAwait);
        assert_eq!("LBGrp".parse::<SortKey>().unwrap(), SortKey::LoadBalancingGroup);
        let err = "bogus".parse::<SortKey>().unwrap_err();
        assert!(err.contains("wareq-sz"));
    }
}
