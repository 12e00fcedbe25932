use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, warn};

use crate::NalUnitType;
use crate::config::AVCDecoderConfigurationRecord;
use crate::error::{ParserError, ParserResult};
use crate::nal::{NalUnit, identify_nalu, identify_nalu_avc, scan_for_start_codes};
use crate::pps::Pps;
use crate::sei::{SeiMessage, parse_sei};
use crate::slice::SliceHeader;
use crate::sps::Sps;
use crate::store::ParameterSetStore;

/// How NAL units are delimited in the buffers handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NalFraming {
    /// `00 00 01` start codes.
    #[default]
    AnnexB,
    /// Big-endian length prefixes, as in `avcC` streams.
    Avc {
        /// Size of the prefix in bytes, 1..=4.
        length_size: u8,
    },
}

impl fmt::Display for NalFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnnexB => f.write_str("annex-b"),
            Self::Avc { length_size } => write!(f, "avc ({length_size} byte lengths)"),
        }
    }
}

/// Settings of a [`NalParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalParserConfig {
    /// Parse the VUI of plain SPS units. Subset SPS units always parse it.
    pub parse_vui_parameters: bool,
    /// Framing used by [`NalParser::nal_units`].
    pub framing: NalFraming,
}

impl Default for NalParserConfig {
    fn default() -> Self {
        Self {
            parse_vui_parameters: true,
            framing: NalFraming::AnnexB,
        }
    }
}

impl fmt::Display for NalParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NalParserConfig {{ parse_vui_parameters: {}, framing: {} }}",
            self.parse_vui_parameters, self.framing
        )
    }
}

impl NalParserConfig {
    /// Starts from the defaults.
    pub fn builder() -> NalParserConfigBuilder {
        NalParserConfigBuilder::default()
    }
}

/// Builder for [`NalParserConfig`].
#[derive(Debug, Clone, Default)]
pub struct NalParserConfigBuilder {
    config: NalParserConfig,
}

impl NalParserConfigBuilder {
    /// Sets [`NalParserConfig::parse_vui_parameters`].
    pub fn parse_vui_parameters(mut self, parse_vui_parameters: bool) -> Self {
        self.config.parse_vui_parameters = parse_vui_parameters;
        self
    }

    /// Sets [`NalParserConfig::framing`].
    pub fn framing(mut self, framing: NalFraming) -> Self {
        self.config.framing = framing;
        self
    }

    /// Returns the config.
    pub fn build(self) -> NalParserConfig {
        self.config
    }
}

/// Stateful H.264 parser.
///
/// Owns the [`ParameterSetStore`]. The `parse_sps`/`parse_pps` family store
/// what they parse, slice headers and SEI messages are resolved against it.
///
/// ```rust
/// use h264::{NalParser, NalParserConfig};
///
/// # let data: &[u8] = &[];
/// let mut parser = NalParser::new(NalParserConfig::default());
/// for nalu in parser.nal_units(data) {
///     match nalu {
///         Ok(nalu) => {
///             // units referencing a missing parameter set are dropped
///             let _ = parser.parse_nal(&nalu);
///         }
///         Err(err) if err.needs_more_data() => break,
///         Err(_) => continue,
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NalParser {
    config: NalParserConfig,
    store: ParameterSetStore,
}

impl NalParser {
    /// Creates a parser with an empty store.
    pub fn new(config: NalParserConfig) -> Self {
        debug!("creating nal parser with {}", config);
        Self {
            config,
            store: ParameterSetStore::new(),
        }
    }

    /// The active settings.
    pub const fn config(&self) -> &NalParserConfig {
        &self.config
    }

    /// The parameter sets stored so far.
    pub const fn store(&self) -> &ParameterSetStore {
        &self.store
    }

    /// Drops every stored parameter set.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    /// Locates the next unit at or after `offset` with the configured framing.
    pub fn identify_nalu<'a>(&self, data: &'a [u8], offset: usize) -> ParserResult<NalUnit<'a>> {
        match self.config.framing {
            NalFraming::AnnexB => identify_nalu(data, offset),
            NalFraming::Avc { length_size } => identify_nalu_avc(data, offset, length_size),
        }
    }

    /// Iterates over the units of `data` with the configured framing.
    pub fn nal_units<'a>(&self, data: &'a [u8]) -> NalUnits<'a> {
        NalUnits {
            data,
            offset: 0,
            framing: self.config.framing,
            done: false,
        }
    }

    /// Parses and stores parameter sets. Every other unit type is accepted as is.
    pub fn parse_nal(&mut self, nalu: &NalUnit) -> ParserResult<()> {
        match nalu.nal_unit_type() {
            NalUnitType::Sps => self.parse_sps(nalu).map(|_| ()),
            NalUnitType::SubsetSps => self.parse_subset_sps(nalu).map(|_| ()),
            NalUnitType::Pps => self.parse_pps(nalu).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Parses an SPS and stores it under its id.
    pub fn parse_sps(&mut self, nalu: &NalUnit) -> ParserResult<&Sps> {
        let sps = Sps::parse(nalu, self.config.parse_vui_parameters)?;
        self.store.store_sps(sps)
    }

    /// Parses a subset SPS and stores it with the plain ones.
    pub fn parse_subset_sps(&mut self, nalu: &NalUnit) -> ParserResult<&Sps> {
        let sps = Sps::parse_subset(nalu)?;
        self.store.store_sps(sps)
    }

    /// Parses a PPS and stores it under its id.
    ///
    /// On [`ParserError::BrokenLink`] nothing is stored.
    pub fn parse_pps(&mut self, nalu: &NalUnit) -> ParserResult<&Pps> {
        let pps = Pps::parse(nalu, &self.store)?;
        Ok(self.store.store_pps(pps))
    }

    /// Stores an already parsed SPS, replacing the one with the same id.
    pub fn update_sps(&mut self, sps: Sps) -> ParserResult<&Sps> {
        debug!("updating sequence parameter set with id: {}", sps.id);
        self.store.store_sps(sps)
    }

    /// Stores an already parsed PPS, replacing the one with the same id.
    ///
    /// The SPS it refers to must be stored already, otherwise
    /// [`ParserError::BrokenLink`] is returned and nothing changes.
    pub fn update_pps(&mut self, pps: Pps) -> ParserResult<&Pps> {
        debug!("updating picture parameter set with id: {}", pps.id);

        if self.store.get_sps(pps.sps_id as u32).is_none() {
            warn!("couldn't find associated sequence parameter set with id: {}", pps.sps_id);
            return Err(ParserError::missing_sps(pps.sps_id as u32));
        }

        Ok(self.store.store_pps(pps))
    }

    /// Parses a slice header against the stored parameter sets.
    pub fn parse_slice_hdr(&self, nalu: &NalUnit) -> ParserResult<SliceHeader> {
        SliceHeader::parse(nalu, &self.store)
    }

    /// Parses the messages of an SEI unit, see [`parse_sei`].
    pub fn parse_sei(&self, nalu: &NalUnit) -> (Vec<SeiMessage>, ParserResult<()>) {
        parse_sei(nalu, &self.store)
    }

    /// Stores the parameter sets of an `avcC` record and switches to its
    /// length prefixed framing.
    pub fn load_avc_config(&mut self, record: &AVCDecoderConfigurationRecord) -> ParserResult<()> {
        self.config.framing = NalFraming::Avc {
            length_size: record.length_size(),
        };

        for data in &record.sps {
            let nalu = NalUnit::from_bytes(data)?;
            self.parse_sps(&nalu)
                .inspect_err(|_| warn!("failed to parse sps from avc config"))?;
        }

        for data in &record.pps {
            let nalu = NalUnit::from_bytes(data)?;
            self.parse_pps(&nalu)
                .inspect_err(|_| warn!("failed to parse pps from avc config"))?;
        }

        Ok(())
    }
}

/// Iterator over the units of a buffer, see [`NalParser::nal_units`].
///
/// A unit with a broken header is reported and skipped. Iteration ends after
/// the first error that needs more input: [`ParserError::NoNal`] or
/// [`ParserError::NoNalEnd`] for Annex-B, where the last unit of a buffer is
/// never terminated, and [`ParserError::NoNalEnd`] for a truncated length
/// prefixed unit. [`NalUnits::offset`] then tells where to resume.
#[derive(Debug, Clone)]
pub struct NalUnits<'a> {
    data: &'a [u8],
    offset: usize,
    framing: NalFraming,
    done: bool,
}

impl NalUnits<'_> {
    /// Offset of the first byte not consumed yet.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Moves past a unit whose header could not be decoded.
    fn skip_broken(&mut self) {
        match self.framing {
            NalFraming::AnnexB => match scan_for_start_codes(&self.data[self.offset..]) {
                Some(start) => self.offset += start + 3,
                None => self.done = true,
            },
            NalFraming::Avc { length_size } => {
                let length_size = length_size as usize;
                let len = BigEndian::read_uint(&self.data[self.offset..], length_size) as usize;
                self.offset += length_size + len;
            }
        }
    }
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = ParserResult<NalUnit<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        let result = match self.framing {
            NalFraming::AnnexB => identify_nalu(self.data, self.offset),
            NalFraming::Avc { length_size } => identify_nalu_avc(self.data, self.offset, length_size),
        };

        match &result {
            Ok(nalu) => self.offset = nalu.offset + nalu.size,
            Err(ParserError::BrokenData) => self.skip_broken(),
            Err(_) => self.done = true,
        }

        Some(result)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use bytes::Bytes;

    use super::*;
    use crate::SliceType;
    use crate::error::ParserResultKind;
    use crate::sei::{SeiPayload, UnhandledPayload};
    use crate::sps::SpsExtension;
    use crate::test_utils::{TestPps, TestSps, init_tracing};
    use crate::writer::{NalPrefix, NalWriter};

    fn idr_slice(prefix: NalPrefix) -> Bytes {
        let mut w = NalWriter::new(3, 5, prefix).unwrap();
        w.write_ue(0).unwrap();
        w.write_ue(7).unwrap();
        w.write_ue(0).unwrap();
        w.write_bits(0, 4).unwrap();
        w.write_ue(0).unwrap();
        w.write_bits(0, 2).unwrap();
        w.write_se(2).unwrap();
        w.write_ue(1).unwrap();
        // some macroblock data
        w.write_bits(0xa5a5, 16).unwrap();
        w.finish().unwrap()
    }

    fn aud() -> Bytes {
        let mut w = NalWriter::new(0, 9, NalPrefix::StartCode3).unwrap();
        w.write_bits(0, 3).unwrap();
        w.finish().unwrap()
    }

    fn annex_b_stream() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&TestSps::default().build());
        data.extend_from_slice(&TestPps::default().build());
        data.extend_from_slice(&idr_slice(NalPrefix::StartCode3));
        data.extend_from_slice(&aud());
        data
    }

    #[test]
    fn test_config_builder() {
        let config = NalParserConfig::builder()
            .parse_vui_parameters(false)
            .framing(NalFraming::Avc { length_size: 4 })
            .build();
        assert!(!config.parse_vui_parameters);
        assert_eq!(config.framing, NalFraming::Avc { length_size: 4 });

        insta::assert_snapshot!(NalParserConfig::default(), @"NalParserConfig { parse_vui_parameters: true, framing: annex-b }");
        insta::assert_snapshot!(config, @"NalParserConfig { parse_vui_parameters: false, framing: avc (4 byte lengths) }");
    }

    #[test]
    fn test_parse_annex_b_stream() {
        init_tracing();

        let data = annex_b_stream();
        let mut parser = NalParser::default();
        let mut types = Vec::new();
        let mut header = None;

        let results: Vec<_> = parser.nal_units(&data).collect();
        for result in results {
            let nalu = match result {
                Ok(nalu) => nalu,
                Err(err) => {
                    assert_eq!(err.kind(), ParserResultKind::NoNalEnd);
                    continue;
                }
            };

            types.push(nalu.nal_unit_type());
            parser.parse_nal(&nalu).unwrap();
            if nalu.nal_unit_type() == NalUnitType::SliceIdr {
                header = Some(parser.parse_slice_hdr(&nalu).unwrap());
            }
        }

        assert_eq!(types, vec![NalUnitType::Sps, NalUnitType::Pps, NalUnitType::SliceIdr]);

        let sps = parser.store().get_sps(0).unwrap();
        assert_eq!(sps.width, 1280);
        assert_eq!(sps.height, 720);
        assert!(parser.store().get_pps(0).is_some());

        let header = header.unwrap();
        assert_eq!(header.slice_type, SliceType::I);
        assert_eq!(header.slice_qp_delta, 2);
        assert_eq!(header.disable_deblocking_filter_idc, 1);
    }

    #[test]
    fn test_last_annex_b_unit_needs_more_data() {
        let data = annex_b_stream();
        let parser = NalParser::default();

        let mut units = parser.nal_units(&data);
        assert!(units.by_ref().take(3).all(|unit| unit.is_ok()));

        let offset = units.offset();
        let err = units.next().unwrap().unwrap_err();
        assert!(err.needs_more_data());
        assert!(units.next().is_none());

        let tail = crate::nal::identify_nalu_unchecked(&data, offset).unwrap();
        assert_eq!(tail.nal_unit_type(), NalUnitType::AuDelimiter);
    }

    #[test]
    fn test_broken_unit_is_skipped() {
        // an access unit delimiter without its payload byte
        let mut data = vec![0x00, 0x00, 0x01, 0x09];
        data.extend_from_slice(&TestSps::default().build());
        data.extend_from_slice(&aud());

        let parser = NalParser::default();
        let kinds: Vec<_> = parser
            .nal_units(&data)
            .map(|unit| unit.map(|nalu| nalu.nal_unit_type()).map_err(|err| err.kind()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                Err(ParserResultKind::BrokenData),
                Ok(NalUnitType::Sps),
                Err(ParserResultKind::NoNalEnd),
            ]
        );
    }

    #[test]
    fn test_pps_without_sps_is_not_stored() {
        let mut parser = NalParser::default();
        let data = TestPps::default().build();
        let nalu = parser.identify_nalu(&data, 0);
        // a lone unit has no end in an annex-b buffer
        assert_eq!(nalu.unwrap_err().kind(), ParserResultKind::NoNalEnd);

        let nalu = NalUnit::from_bytes(&data[4..]).unwrap();
        let err = parser.parse_pps(&nalu).unwrap_err();
        assert!(matches!(err, ParserError::BrokenLink { id: 0, .. }));
        assert!(parser.store().get_pps(0).is_none());
        assert!(parser.store().last_pps().is_none());
    }

    #[test]
    fn test_update_parameter_sets() {
        let mut source = NalParser::default();
        let sps = TestSps {
            id: 2,
            ..Default::default()
        }
        .build();
        let sps = source.parse_sps(&NalUnit::from_bytes(&sps[4..]).unwrap()).unwrap().clone();
        let pps = TestPps {
            id: 7,
            sps_id: 2,
            entropy_coding_mode_flag: true,
            ..Default::default()
        }
        .build();
        let pps = source.parse_pps(&NalUnit::from_bytes(&pps[4..]).unwrap()).unwrap().clone();

        let mut parser = NalParser::default();
        let err = parser.update_pps(pps.clone()).unwrap_err();
        assert!(matches!(err, ParserError::BrokenLink { id: 2, .. }));
        assert!(parser.store().get_pps(7).is_none());

        assert_eq!(parser.update_sps(sps).unwrap().id, 2);
        assert_eq!(parser.store().last_sps().map(|sps| sps.id), Some(2));

        assert!(parser.update_pps(pps).unwrap().entropy_coding_mode_flag);
        assert_eq!(parser.store().last_pps().map(|pps| pps.id), Some(7));
        assert_eq!(parser.store().get_pps(7).map(|pps| pps.sps_id), Some(2));
    }

    #[test]
    fn test_truncated_pps_keeps_previous() {
        let mut parser = NalParser::default();
        let sps = TestSps::default().build();
        parser.parse_sps(&NalUnit::from_bytes(&sps[4..]).unwrap()).unwrap();
        let pps = TestPps::default().build();
        parser.parse_pps(&NalUnit::from_bytes(&pps[4..]).unwrap()).unwrap();

        let newer = TestPps {
            entropy_coding_mode_flag: true,
            ..Default::default()
        }
        .build();
        let truncated = NalUnit::from_bytes(&newer[4..6]).unwrap();
        let err = parser.parse_pps(&truncated).unwrap_err();
        assert_eq!(err.kind(), ParserResultKind::Error);

        assert!(!parser.store().get_pps(0).unwrap().entropy_coding_mode_flag);
    }

    #[test]
    fn test_reference_modifications_overflow() {
        let mut parser = NalParser::default();
        let sps = TestSps::default().build();
        parser.parse_sps(&NalUnit::from_bytes(&sps[4..]).unwrap()).unwrap();
        let pps = TestPps::default().build();
        parser.parse_pps(&NalUnit::from_bytes(&pps[4..]).unwrap()).unwrap();

        let mut w = NalWriter::new(2, 1, NalPrefix::StartCode3).unwrap();
        w.write_ue(0).unwrap();
        w.write_ue(5).unwrap();
        w.write_ue(0).unwrap();
        w.write_bits(1, 4).unwrap();
        // num_ref_idx_active_override_flag, ref_pic_list_modification_flag_l0
        w.write_bit(false).unwrap();
        w.write_bit(true).unwrap();
        for _ in 0..40 {
            w.write_ue(0).unwrap();
            w.write_ue(0).unwrap();
        }
        w.write_ue(3).unwrap();
        let data = w.finish().unwrap();

        let err = parser.parse_slice_hdr(&NalUnit::from_bytes(&data[3..]).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ParserResultKind::Error);
    }

    #[test]
    fn test_sei_size_clamped() {
        let parser = NalParser::default();
        let data = [0x06, 0x02, 0xc8, 0x11, 0x22, 0x33, 0x44, 0x80];
        let (messages, result) = parser.parse_sei(&NalUnit::from_bytes(&data).unwrap());

        result.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload_size, 200);
        assert_eq!(
            messages[0].payload,
            SeiPayload::Unknown(UnhandledPayload {
                payload_type: 2,
                data: Bytes::from_static(&[0x11, 0x22, 0x33, 0x44, 0x80]),
            })
        );
    }

    #[test]
    fn test_subset_sps_shares_the_sps_table() {
        let mut parser = NalParser::default();
        let data = TestSps {
            id: 2,
            profile_idc: 100,
            ..Default::default()
        }
        .build_with(15, |_| {});

        parser.parse_nal(&NalUnit::from_bytes(&data[4..]).unwrap()).unwrap();
        let sps = parser.store().get_sps(2).unwrap();
        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.extension, SpsExtension::None);
        assert_eq!(parser.store().last_sps().map(|sps| sps.id), Some(2));
    }

    #[test]
    fn test_vui_skipped_by_config() {
        let mut parser = NalParser::new(NalParserConfig::builder().parse_vui_parameters(false).build());
        let data = TestSps {
            timing: Some((1, 60, false)),
            ..Default::default()
        }
        .build();

        let sps = parser.parse_sps(&NalUnit::from_bytes(&data[4..]).unwrap()).unwrap();
        assert!(sps.vui_parameters_present_flag);
        assert!(sps.vui_parameters.is_none());
    }

    #[test]
    fn test_avc_config_and_length_prefixed_units() {
        init_tracing();

        let sps = TestSps::default().build().slice(4..);
        let pps = TestPps::default().build().slice(4..);
        let mut record = vec![0x01, 66, 0x00, 31, 0xfe, 0xe1];
        record.extend_from_slice(&(sps.len() as u16).to_be_bytes());
        record.extend_from_slice(&sps);
        record.push(0x01);
        record.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        record.extend_from_slice(&pps);
        let record = AVCDecoderConfigurationRecord::parse(&mut io::Cursor::new(Bytes::from(record))).unwrap();

        let mut parser = NalParser::default();
        parser.load_avc_config(&record).unwrap();
        assert_eq!(parser.config().framing, NalFraming::Avc { length_size: 3 });
        assert!(parser.store().get_sps(0).is_some());
        assert!(parser.store().get_pps(0).is_some());

        let mut data = idr_slice(NalPrefix::Length(3)).to_vec();
        data.extend_from_slice(&idr_slice(NalPrefix::Length(3)));
        // a third unit announcing more bytes than present
        data.extend_from_slice(&[0x00, 0x00, 0x10, 0x65]);

        let units: Vec<_> = parser.nal_units(&data).collect();
        assert_eq!(units.len(), 3);
        for unit in &units[..2] {
            let nalu = unit.as_ref().unwrap();
            assert_eq!(parser.parse_slice_hdr(nalu).unwrap().slice_type, SliceType::I);
        }
        assert_eq!(units[2].as_ref().unwrap_err().kind(), ParserResultKind::NoNalEnd);
    }

    #[test]
    fn test_avc_config_with_broken_sps() {
        let record = AVCDecoderConfigurationRecord {
            configuration_version: 1,
            profile_indication: 66,
            profile_compatibility: 0,
            level_indication: 31,
            length_size_minus_one: 3,
            sps: vec![Bytes::from_static(&[0x67, 0x42])],
            pps: Vec::new(),
            extended_config: None,
        };

        let mut parser = NalParser::default();
        assert_eq!(parser.load_avc_config(&record).unwrap_err().kind(), ParserResultKind::Error);
        assert!(parser.store().last_sps().is_none());
    }
}
