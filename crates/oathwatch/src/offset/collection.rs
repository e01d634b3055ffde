use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::chain::PointerChain;

/// Records the game exposes through pointer chains.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ChainKind {
    Entity,
    Stats,
    Map,
    LegacyMap,
    Pet,
}

impl ChainKind {
    /// The legacy map chain still appears in old configs but rarely resolves.
    pub fn is_reliable(self) -> bool {
        !matches!(self, ChainKind::LegacyMap)
    }
}

/// The named chains one game build uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerChains {
    pub entity: PointerChain,
    pub stats: PointerChain,
    pub map: PointerChain,
    pub legacy_map: PointerChain,
    pub pet: PointerChain,
}

impl Default for PointerChains {
    fn default() -> Self {
        Self {
            entity: PointerChain::literal(&[2381824, 12]),
            stats: PointerChain::literal(&[2381824, 12, 340, 4]),
            map: PointerChain::literal(&[2381824, 13692]),
            legacy_map: PointerChain::literal(&[1933288, 14232]),
            pet: PointerChain::literal(&[7319540, 299356]),
        }
    }
}

impl PointerChains {
    pub fn get(&self, kind: ChainKind) -> &PointerChain {
        match kind {
            ChainKind::Entity => &self.entity,
            ChainKind::Stats => &self.stats,
            ChainKind::Map => &self.map,
            ChainKind::LegacyMap => &self.legacy_map,
            ChainKind::Pet => &self.pet,
        }
    }

    pub fn get_mut(&mut self, kind: ChainKind) -> &mut PointerChain {
        match kind {
            ChainKind::Entity => &mut self.entity,
            ChainKind::Stats => &mut self.stats,
            ChainKind::Map => &mut self.map,
            ChainKind::LegacyMap => &mut self.legacy_map,
            ChainKind::Pet => &mut self.pet,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChainKind, &PointerChain)> {
        use strum::IntoEnumIterator;
        ChainKind::iter().map(move |kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chains() {
        let chains = PointerChains::default();
        assert_eq!(chains.stats.offsets(), &[2381824, 12, 340, 4]);
        assert_eq!(chains.get(ChainKind::Pet).offsets(), &[7319540, 299356]);
        assert_eq!(chains.iter().count(), 5);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ChainKind::LegacyMap.to_string(), "legacy-map");
        assert_eq!("STATS".parse::<ChainKind>().unwrap(), ChainKind::Stats);
        assert!(!ChainKind::LegacyMap.is_reliable());
        assert!(ChainKind::Map.is_reliable());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let chains: PointerChains = serde_json::from_str(r#"{"map": [100, 8]}"#).unwrap();
        assert_eq!(chains.map.offsets(), &[100, 8]);
        assert_eq!(chains.entity, PointerChains::default().entity);
    }
}
