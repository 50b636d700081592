#![allow(dead_code)]

use paramforge::api::{prepare_template, ModelFile, PreparedTemplate};
use paramforge::bounds::BoundSet;
use paramforge::config::PrepareOptions;

/// Hydrology file with GRU columns declared as units 1, 5, 6, 8, 10.
pub const HYDROLOGY_INI: &str = r"2.0: MESH_parameters_hydrology.ini
!> Hydrology parameters for the test basin
##### Option Flags #####
----#
    0                                   # Number of option flags
##### Channel routing parameters #####
-----#
    3                                   # Number of channel routing parameters
WF_R2     0.30    0.25                  # channel roughness
FLZ       0.001   0.002
PWR       2.0     2.1
##### GRU class independent hydrologic parameters #####
-------#
    2                                   # Number of GRU independent hydrologic parameters
SOIL_POR_MAX  0.8
SOIL_DEPTH    4.1                       # metres
##### GRU class dependent hydrologic parameters #####
-------#
    2                                   # Number of GRU dependent hydrologic parameters
!>  GRU:  1     5     6     8     10
ZSNL  0.5  0.14  0.6  0.3  0.1
ZPLS  0.04  0.04  0.04  0.04  0.04
";

pub const HYDROLOGY_GRU_ORDER: [u32; 5] = [1, 5, 6, 8, 10];

/// Two GRU blocks: needleleaf (unit 1) and grassland (unit 2), 8-column cells.
pub const CLASS_INI: &str = r"Test Basin                                                                01 Title
Jane Doe                                                                  02 Author
Somewhere                                                                 03 Location
   53.00 -117.00   40.00   40.00   50.00    -1.0       1       1       2  04 DEGLAT/DEGLON/ZRFMGRD/ZRFHGRD/ZBLDGRD/GCGRD/ILW/NL/NM

   1.000   0.000   0.000   0.000   0.000   1.450   0.000   0.000   0.000  05 5xFCAN/4xLAMX
  -2.300   0.000   0.000   0.000   0.000   0.900   0.000   0.000   0.000  06 5xLNZ0/4xLAMN
   0.045   0.000   0.000   0.000   0.000   2.200   0.000   0.000   0.000  07 5xALVC/4xCMAS
   0.340   0.000   0.000   0.000   0.000   1.200   0.000   0.000   0.000  08 5xALIC/4xROOT
  85.000   0.000   0.000   0.000  30.000   0.000   0.000   0.000          09 4xRSMN/4xQA50
   0.500   0.000   0.000   0.000   0.930   0.000   0.000   0.000          10 4xVPDA/4xVPDB
 100.000   0.000   0.000   0.000   5.000   0.000   0.000   0.000          11 4xPSGA/4xPSGB
   1.000   2.000   1.000  50.000                                          12 DRN/SDEP/FARE/DD
   0.030   0.350   0.100   0.050     100   Needleleaf forest                         13 XSLP/XDRAINH/MANN/KSAT/MID
  40.000  40.000  40.000                                                  14 3xSAND (or more)
  20.000  20.000  20.000                                                  15 3xCLAY (or more)
   0.000   0.000   0.000                                                  16 3xORG (or more)
   4.000   2.000   1.000   4.000   0.000   4.000                          17 3xTBAR (or more)/TCAN/TSNO/TPND
   0.250   0.250   0.250   0.000   0.000   0.000   0.000                  18 3xTHLQ (or more)/3xTHIC (or more)/ZPND
   0.000   0.000   0.000   0.750 300.000   1.000                          19 RCAN/SCAN/SNO/ALBS/RHOS/GRO

   0.000   0.000   0.000   1.000   0.000   0.000   0.000   0.000   1.450  05 5xFCAN/4xLAMX
   0.000   0.000   0.000  -2.300   0.000   0.000   0.000   0.000   0.900  06 5xLNZ0/4xLAMN
   0.000   0.000   0.000   0.045   0.000   0.000   0.000   0.000   2.200  07 5xALVC/4xCMAS
   0.000   0.000   0.000   0.340   0.000   0.000   0.000   0.000   1.200  08 5xALIC/4xROOT
   0.000   0.000   0.000  85.000   0.000   0.000   0.000  36.000          09 4xRSMN/4xQA50
   0.000   0.000   0.000   0.500   0.000   0.000   0.000   0.930          10 4xVPDA/4xVPDB
   0.000   0.000   0.000 100.000   0.000   0.000   0.000   5.000          11 4xPSGA/4xPSGB
   1.000   2.000   1.000  50.000                                          12 DRN/SDEP/FARE/DD
   0.030   0.350   0.100   0.050     100   Grassland                                 13 XSLP/XDRAINH/MANN/KSAT/MID
  40.000  40.000  40.000                                                  14 3xSAND (or more)
  20.000  20.000  20.000                                                  15 3xCLAY (or more)
   0.000   0.000   0.000                                                  16 3xORG (or more)
   4.000   2.000   1.000   4.000   0.000   4.000                          17 3xTBAR (or more)/TCAN/TSNO/TPND
   0.250   0.250   0.250   0.000   0.000   0.000   0.000                  18 3xTHLQ (or more)/3xTHIC (or more)/ZPND
   0.000   0.000   0.000   0.750 300.000   1.000                          19 RCAN/SCAN/SNO/ALBS/RHOS/GRO

       0       0       0       0                                          20 IHOUR/IMINS/IJDAY/IYEAR
       0       0       0       0                                          21 IHOUR/IMINS/IJDAY/IYEAR
";

pub fn hydrology_options() -> PrepareOptions {
    PrepareOptions {
        gru_order: Some(HYDROLOGY_GRU_ORDER.to_vec()),
        ..Default::default()
    }
}

pub fn bounds(json: &str) -> BoundSet {
    BoundSet::from_json_str(json).unwrap()
}

pub fn prepare_hydrology(bounds_json: &str) -> PreparedTemplate {
    prepare_template(
        ModelFile::Hydrology,
        HYDROLOGY_INI,
        &bounds(bounds_json),
        &hydrology_options(),
    )
    .unwrap()
}

pub fn prepare_class(bounds_json: &str) -> PreparedTemplate {
    prepare_template(
        ModelFile::Class,
        CLASS_INI,
        &bounds(bounds_json),
        &PrepareOptions::default(),
    )
    .unwrap()
}

/// The line of `text` that starts with `label` followed by whitespace.
pub fn row<'a>(text: &'a str, label: &str) -> &'a str {
    text.lines()
        .find(|l| l.split_whitespace().next() == Some(label))
        .unwrap()
}
