//! Module identification responses.

use crate::error::{Error, Result};

/// Firmware revision byte, nibble-encoded (0x19 is revision 1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion(pub u8);

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}.{:x}", self.0 >> 4, self.0 & 0x0F)
    }
}

/// Module families the type command (FE 37) can report.
///
/// Variant names mirror the vendor model numbers.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    Lcd0821,
    Lcd2021,
    Lcd2041,
    Lcd4021,
    Lcd4041,
    Lk202_25,
    Lk204_25,
    Lk404_55,
    Vfd2021,
    Vfd2041,
    Vfd4021,
    Vk202_25,
    Vk204_25,
    Glc12232,
    Glc24064,
    Glk24064_25,
    Glk12232_25,
    Glk12232_25Sm,
    Glk24064_16_1U_Usb,
    Glk24064_16_1U,
    Glk19264_7T_1U_Usb,
    Glk12236_16,
    Glk12232_16Sm,
    Glk19264_7T_1U,
    Lk204_7T_1U,
    Lk204_7T_1U_Usb,
    Lk404At,
    MosAv162A,
    Lk402_12,
    Lk162_12,
    Lk204_25Pc,
    Lk202_24Usb,
    Vk202_24Usb,
    Lk204_24Usb,
    Vk204_24Usb,
    Pk162_12,
    Vk162_12,
    MosAp162A,
    Pk202_25,
    MosAl162A,
    MosAl202A,
    MosAv202A,
    MosAp202A,
    Pk202_24Usb,
    MosAl082,
    MosAl204,
    MosAv204,
    MosAl402,
    MosAv402,
    Lk082_12,
    Vk402_12,
    Vk404_55,
    Lk402_25,
    Vk402_25,
    Pk204_25,
    Mos,
    Moi,
    XBoardS,
    XBoardI,
    Mou,
    XBoardU,
    Lk202_25Usb,
    Vk202_25Usb,
    Lk204_25Usb,
    Vk204_25Usb,
    Lk162_12Tc,
    Glk240128_25,
    Lk404_25,
    Vk404_25,
}

impl ModuleType {
    /// Decodes the type byte FE 37 returns.
    pub fn from_byte(value: u8) -> Result<Self> {
        use ModuleType::*;
        Ok(match value {
            0x01 => Lcd0821,
            0x02 => Lcd2021,
            0x05 => Lcd2041,
            0x06 => Lcd4021,
            0x07 => Lcd4041,
            0x08 => Lk202_25,
            0x09 => Lk204_25,
            0x0A => Lk404_55,
            0x0B => Vfd2021,
            0x0C => Vfd2041,
            0x0D => Vfd4021,
            0x0E => Vk202_25,
            0x0F => Vk204_25,
            0x10 => Glc12232,
            0x13 => Glc24064,
            0x15 => Glk24064_25,
            0x22 => Glk12232_25,
            0x24 => Glk12232_25Sm,
            0x25 => Glk24064_16_1U_Usb,
            0x26 => Glk24064_16_1U,
            0x27 => Glk19264_7T_1U_Usb,
            0x28 => Glk12236_16,
            0x29 => Glk12232_16Sm,
            0x2A => Glk19264_7T_1U,
            0x2B => Lk204_7T_1U,
            0x2C => Lk204_7T_1U_Usb,
            0x31 => Lk404At,
            0x32 => MosAv162A,
            0x33 => Lk402_12,
            0x34 => Lk162_12,
            0x35 => Lk204_25Pc,
            0x36 => Lk202_24Usb,
            0x37 => Vk202_24Usb,
            0x38 => Lk204_24Usb,
            0x39 => Vk204_24Usb,
            0x3A => Pk162_12,
            0x3B => Vk162_12,
            0x3C => MosAp162A,
            0x3D => Pk202_25,
            0x3E => MosAl162A,
            0x3F => MosAl202A,
            0x40 => MosAv202A,
            0x41 => MosAp202A,
            0x42 => Pk202_24Usb,
            0x43 => MosAl082,
            0x44 => MosAl204,
            0x45 => MosAv204,
            0x46 => MosAl402,
            0x47 => MosAv402,
            0x48 => Lk082_12,
            0x49 => Vk402_12,
            0x4A => Vk404_55,
            0x4B => Lk402_25,
            0x4C => Vk402_25,
            0x4D => Pk204_25,
            0x4F => Mos,
            0x50 => Moi,
            0x51 => XBoardS,
            0x52 => XBoardI,
            0x53 => Mou,
            0x54 => XBoardU,
            0x55 => Lk202_25Usb,
            0x56 => Vk202_25Usb,
            0x57 => Lk204_25Usb,
            0x58 => Vk204_25Usb,
            0x5B => Lk162_12Tc,
            0x72 => Glk240128_25,
            0x73 => Lk404_25,
            0x74 => Vk404_25,
            other => return Err(Error::UnknownModuleType(other)),
        })
    }

    /// True for the graphic (GLK/GLC) families that support the drawing
    /// and bitmap commands.
    pub fn is_graphic(&self) -> bool {
        use ModuleType::*;
        matches!(
            self,
            Glc12232
                | Glc24064
                | Glk24064_25
                | Glk12232_25
                | Glk12232_25Sm
                | Glk24064_16_1U_Usb
                | Glk24064_16_1U
                | Glk19264_7T_1U_Usb
                | Glk12236_16
                | Glk12232_16Sm
                | Glk19264_7T_1U
                | Glk240128_25
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display() {
        assert_eq!(FirmwareVersion(0x19).to_string(), "1.9");
        assert_eq!(FirmwareVersion(0x57).to_string(), "5.7");
    }

    #[test]
    fn test_module_type_from_byte() {
        assert_eq!(
            ModuleType::from_byte(0x2A).unwrap(),
            ModuleType::Glk19264_7T_1U
        );
        assert_eq!(ModuleType::from_byte(0x01).unwrap(), ModuleType::Lcd0821);
        assert!(matches!(
            ModuleType::from_byte(0xFF),
            Err(Error::UnknownModuleType(0xFF))
        ));
    }

    #[test]
    fn test_graphic_families() {
        assert!(ModuleType::Glk19264_7T_1U.is_graphic());
        assert!(!ModuleType::Lk204_25.is_graphic());
    }
}
