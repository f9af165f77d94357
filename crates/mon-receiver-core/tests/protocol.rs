//! Tests for frame recovery and packet decoding

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mon_receiver_core::diagnostics::DiagnosticKind;
    use mon_receiver_core::pipeline::PacketCollector;
    use mon_receiver_core::prelude::*;
    use mon_receiver_core::protocol::{decode_frame, CRC_OFFSET, RECORD_LEN};

    fn decoder() -> (FrameDecoder, PacketCollector, Arc<MemoryDiagnostics>) {
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let collector = PacketCollector::new();
        let mut decoder = FrameDecoder::new(diagnostics.clone());
        decoder.set_listener(Box::new(collector.clone()));
        (decoder, collector, diagnostics)
    }

    #[test]
    fn test_frame_roundtrip() {
        let packet = Packet::new("flow", 12.75).unwrap();
        let frame = packet.to_frame();

        assert_eq!(frame.last(), Some(&0x00));
        assert!(!frame[..frame.len() - 1].contains(&0x00));

        let decoded = decode_frame(&frame[..frame.len() - 1]).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_zero_value_survives_stuffing() {
        // 0.0 encodes as four zero bytes in the record
        let packet = Packet::new("p", 0.0).unwrap();
        let frame = packet.to_frame();
        assert_eq!(frame.iter().filter(|&&b| b == 0x00).count(), 1);

        let (mut decoder, collector, _) = decoder();
        decoder.on_data(&frame);
        assert_eq!(collector.packets(), vec![packet]);
    }

    #[test]
    fn test_any_corrupted_byte_is_rejected() {
        let packet = Packet::new("temp", 36.6).unwrap();

        for index in 0..CRC_OFFSET {
            let mut record = packet.to_record();
            record[index] ^= 0x5A;

            let result = Packet::from_record(&record);
            assert!(result.is_err(), "flipping byte {index} was not detected");
        }
    }

    #[test]
    fn test_corrupted_frame_reports_checksum_mismatch() {
        let mut record = Packet::new("temp", 36.6).unwrap().to_record();
        // Flip a value byte; the name stays valid ASCII
        record[7] ^= 0x01;
        let mut frame = cobs::encode_vec(&record);
        frame.push(0x00);

        let (mut decoder, collector, diagnostics) = decoder();
        decoder.on_data(&frame);

        assert!(collector.is_empty());
        assert_eq!(diagnostics.events(), vec![DiagnosticKind::ChecksumMismatch]);
    }

    #[test]
    fn test_wrong_size_record_is_structural() {
        let mut frame = cobs::encode_vec(&[b'x'; RECORD_LEN + 2]);
        frame.push(0x00);

        let (mut decoder, collector, diagnostics) = decoder();
        decoder.on_data(&frame);

        assert!(collector.is_empty());
        assert_eq!(
            diagnostics.events(),
            vec![DiagnosticKind::StructuralDecodeFailure]
        );
    }

    #[test]
    fn test_control_characters_in_name_are_structural() {
        let mut record = [0u8; RECORD_LEN];
        record[..3].copy_from_slice(b"a\nb");
        record[6..10].copy_from_slice(&1.0f32.to_le_bytes());
        let crc = crc32fast::hash(&record[..CRC_OFFSET]);
        record[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        let mut chunk = cobs::encode_vec(&record);
        chunk.push(0x00);
        let good = Packet::new("flow", 2.0).unwrap();
        chunk.extend(good.to_frame());

        let (mut decoder, collector, diagnostics) = decoder();
        decoder.on_data(&chunk);

        assert_eq!(collector.packets(), vec![good]);
        assert_eq!(
            diagnostics.events(),
            vec![DiagnosticKind::StructuralDecodeFailure]
        );
    }

    #[test]
    fn test_degenerate_input_never_panics() {
        let (mut decoder, collector, _) = decoder();

        decoder.on_data(&[]);
        decoder.on_data(&[0x00]);
        decoder.on_data(&[0x00, 0x00, 0x00]);
        decoder.on_data(&[0xFF; 32]);
        decoder.on_data(&[0x01, 0x00]);

        assert!(collector.is_empty());
    }

    #[test]
    fn test_data_without_delimiter_is_held() {
        let (mut decoder, collector, diagnostics) = decoder();
        let frame = Packet::new("flow", 1.0).unwrap().to_frame();

        decoder.on_data(&frame[..frame.len() - 1]);

        assert!(collector.is_empty());
        assert!(diagnostics.events().is_empty());
        assert_eq!(decoder.pending(), frame.len() - 1);
    }

    #[test]
    fn test_back_to_back_frames() {
        let a = Packet::new("flow", 1.0).unwrap();
        let b = Packet::new("pres", 2.0).unwrap();
        let mut chunk = a.to_frame();
        chunk.extend(b.to_frame());

        let (mut decoder, collector, _) = decoder();
        decoder.on_data(&chunk);

        assert_eq!(collector.packets(), vec![a, b]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let packets = vec![
            Packet::new("flow", 1.0).unwrap(),
            Packet::new("pres", -2.5).unwrap(),
            Packet::new("volume", 480.0).unwrap(),
        ];
        let stream: Vec<u8> = packets.iter().flat_map(Packet::to_frame).collect();

        for split in 1..stream.len() {
            let (mut decoder, collector, diagnostics) = decoder();
            decoder.on_data(&stream[..split]);
            decoder.on_data(&stream[split..]);

            assert_eq!(collector.packets(), packets, "split at {split}");
            assert!(diagnostics.events().is_empty(), "split at {split}");
        }
    }

    #[test]
    fn test_bad_frame_does_not_poison_stream() {
        let good = Packet::new("flow", 3.0).unwrap();
        let mut chunk = vec![0x05, 0x01, 0x00];
        chunk.extend(good.to_frame());

        let (mut decoder, collector, diagnostics) = decoder();
        decoder.on_data(&chunk);

        assert_eq!(collector.packets(), vec![good]);
        assert_eq!(diagnostics.events().len(), 1);
    }

    #[test]
    fn test_runaway_data_is_discarded() {
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let collector = PacketCollector::new();
        let mut decoder = FrameDecoder::new(diagnostics.clone()).with_max_buffer(64);
        decoder.set_listener(Box::new(collector.clone()));

        decoder.on_data(&[0x07; 100]);
        assert_eq!(decoder.pending(), 0);
        assert_eq!(diagnostics.count(DiagnosticKind::BufferOverflow), 1);

        let packet = Packet::new("flow", 4.0).unwrap();
        decoder.on_data(&packet.to_frame());
        assert_eq!(collector.packets(), vec![packet]);
    }
}
