//! Loading the shipped configuration and building devices from it.

use std::sync::Arc;

use beamline_devices::channel::MockChannelBackend;
use beamline_devices::config::{BeamlineConfig, ConfigError, PickerKind};
use beamline_devices::device::{IocAdminLayout, PickerCommand};

#[tokio::test]
async fn test_shipped_config_builds_pulse_pickers() {
    let config = BeamlineConfig::load_from("config/beamline.toml").unwrap();
    assert_eq!(config.pulse_pickers[0].variant, PickerKind::Ccm);

    let backend = MockChannelBackend::new();
    backend
        .seed_enum("XPP:SB2:PP:Y", &["IN", "OUT", "CCM"], "OUT")
        .await;
    let pickers = config.build_pulse_pickers(Arc::new(backend.clone())).unwrap();
    assert_eq!(pickers.len(), 1);

    let picker = &pickers[0];
    assert_eq!(picker.name(), "xpp_pp");
    assert_eq!(picker.command(PickerCommand::MoveCcm).await.unwrap(), "CCM");
    assert_eq!(picker.position_label().await.unwrap(), "CCM");

    match picker {
        beamline_devices::device::AnyPulsePicker::Ccm(ccm) => {
            let ioc = ccm.ioc().unwrap();
            assert_eq!(ioc.prefix(), "IOC:XPP:SB2:MMS");
            assert_eq!(ioc.layout(), IocAdminLayout::Legacy);
        }
        other => panic!("expected a CCM pulse picker, got {}", other.kind()),
    }
}

#[test]
fn test_missing_file_fails_to_load() {
    // No [application] table anywhere, so extraction fails before validation
    let err = BeamlineConfig::load_from("config/does-not-exist.toml").unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}
