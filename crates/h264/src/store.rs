use tracing::debug;

use crate::error::{ParserError, ParserResult};
use crate::pps::{MAX_PPS_COUNT, Pps};
use crate::sps::{MAX_SPS_COUNT, Sps};

/// Parsed parameter sets addressed by id.
///
/// A slot holds the last parameter set stored under its id. Storing replaces
/// the previous value with an owned copy, MVC data and slice group ids
/// included. Failed parses never reach the store.
#[derive(Debug, Clone)]
pub struct ParameterSetStore {
    sps: Box<[Option<Sps>]>,
    pps: Box<[Option<Pps>]>,
    last_sps: Option<u8>,
    last_pps: Option<u8>,
}

impl Default for ParameterSetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            sps: vec![None; MAX_SPS_COUNT].into_boxed_slice(),
            pps: vec![None; MAX_PPS_COUNT].into_boxed_slice(),
            last_sps: None,
            last_pps: None,
        }
    }

    /// The SPS stored under `id`.
    pub fn get_sps(&self, id: u32) -> Option<&Sps> {
        self.sps.get(id as usize)?.as_ref()
    }

    /// The PPS stored under `id`.
    pub fn get_pps(&self, id: u32) -> Option<&Pps> {
        self.pps.get(id as usize)?.as_ref()
    }

    /// The most recently stored SPS.
    pub fn last_sps(&self) -> Option<&Sps> {
        self.get_sps(self.last_sps? as u32)
    }

    /// The most recently stored PPS.
    pub fn last_pps(&self) -> Option<&Pps> {
        self.get_pps(self.last_pps? as u32)
    }

    /// Stores `sps` under its id and makes it the last SPS.
    ///
    /// Fails if the id is beyond 31.
    pub fn store_sps(&mut self, sps: Sps) -> ParserResult<&Sps> {
        let id = sps.id;
        let slot = self
            .sps
            .get_mut(id as usize)
            .ok_or_else(|| ParserError::invalid(format!("sps id out of range: {id}")))?;

        debug!("adding sequence parameter set with id: {}", id);
        self.last_sps = Some(id);
        Ok(slot.insert(sps))
    }

    /// Stores `pps` under its id and makes it the last PPS.
    pub fn store_pps(&mut self, pps: Pps) -> &Pps {
        debug!("adding picture parameter set with id: {}", pps.id);

        let id = pps.id;
        self.last_pps = Some(id);
        self.pps[id as usize].insert(pps)
    }

    /// Drops every stored parameter set.
    pub fn clear(&mut self) {
        self.sps.iter_mut().for_each(|slot| *slot = None);
        self.pps.iter_mut().for_each(|slot| *slot = None);
        self.last_sps = None;
        self.last_pps = None;
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::sps::{SpsExtension, SpsMvcExtension, SpsMvcView};

    #[test]
    fn test_store_and_replace() {
        let mut store = ParameterSetStore::new();
        assert!(store.get_sps(0).is_none());
        assert!(store.last_sps().is_none());
        assert!(store.get_sps(40).is_none());

        let mvc = Sps {
            id: 3,
            extension: SpsExtension::Mvc(SpsMvcExtension {
                views: vec![SpsMvcView::default(); 2],
                level_values: Vec::new(),
            }),
            ..Default::default()
        };
        store.store_sps(mvc).unwrap();
        assert_eq!(store.get_sps(3).and_then(Sps::mvc).map(|mvc| mvc.views.len()), Some(2));

        let plain = Sps {
            id: 3,
            level_idc: 40,
            ..Default::default()
        };
        assert_eq!(store.store_sps(plain).unwrap().level_idc, 40);
        assert_eq!(store.get_sps(3).unwrap().extension, SpsExtension::None);
        assert_eq!(store.last_sps().map(|sps| sps.id), Some(3));

        store.store_pps(Pps {
            id: 255,
            sps_id: 3,
            ..Default::default()
        });
        assert_eq!(store.last_pps().map(|pps| pps.id), Some(255));

        let out_of_range = Sps {
            id: 32,
            ..Default::default()
        };
        assert!(store.store_sps(out_of_range).is_err());
        assert_eq!(store.last_sps().map(|sps| sps.id), Some(3));

        store.clear();
        assert!(store.get_sps(3).is_none());
        assert!(store.last_pps().is_none());
    }
}
