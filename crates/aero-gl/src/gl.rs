//! Raw legacy API enumerator values as they appear in decoded trace records.
//!
//! Only tokens the core understands are listed. Anything else reaching a
//! translator is reported as an unsupported enumerator.

// Primitives.
pub const POINTS: u32 = 0x0000;
pub const LINES: u32 = 0x0001;
pub const LINE_LOOP: u32 = 0x0002;
pub const LINE_STRIP: u32 = 0x0003;
pub const TRIANGLES: u32 = 0x0004;
pub const TRIANGLE_STRIP: u32 = 0x0005;
pub const TRIANGLE_FAN: u32 = 0x0006;
pub const QUADS: u32 = 0x0007;
pub const QUAD_STRIP: u32 = 0x0008;
pub const POLYGON: u32 = 0x0009;

// Comparison functions.
pub const NEVER: u32 = 0x0200;
pub const LESS: u32 = 0x0201;
pub const EQUAL: u32 = 0x0202;
pub const LEQUAL: u32 = 0x0203;
pub const GREATER: u32 = 0x0204;
pub const NOTEQUAL: u32 = 0x0205;
pub const GEQUAL: u32 = 0x0206;
pub const ALWAYS: u32 = 0x0207;

// Blend factors and equations.
pub const ZERO: u32 = 0x0000;
pub const ONE: u32 = 0x0001;
pub const SRC_COLOR: u32 = 0x0300;
pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
pub const SRC_ALPHA: u32 = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
pub const DST_ALPHA: u32 = 0x0304;
pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
pub const DST_COLOR: u32 = 0x0306;
pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
pub const SRC_ALPHA_SATURATE: u32 = 0x0308;
pub const CONSTANT_COLOR: u32 = 0x8001;
pub const ONE_MINUS_CONSTANT_COLOR: u32 = 0x8002;
pub const CONSTANT_ALPHA: u32 = 0x8003;
pub const ONE_MINUS_CONSTANT_ALPHA: u32 = 0x8004;
pub const FUNC_ADD: u32 = 0x8006;
pub const MIN: u32 = 0x8007;
pub const MAX: u32 = 0x8008;
pub const FUNC_SUBTRACT: u32 = 0x800A;
pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;

// Faces and winding.
pub const FRONT: u32 = 0x0404;
pub const BACK: u32 = 0x0405;
pub const FRONT_AND_BACK: u32 = 0x0408;
pub const CW: u32 = 0x0900;
pub const CCW: u32 = 0x0901;

// Shade model and polygon mode.
pub const FLAT: u32 = 0x1D00;
pub const SMOOTH: u32 = 0x1D01;
pub const POINT: u32 = 0x1B00;
pub const LINE: u32 = 0x1B01;
pub const FILL: u32 = 0x1B02;

// Stencil operations.
pub const KEEP: u32 = 0x1E00;
pub const REPLACE: u32 = 0x1E01;
pub const INCR: u32 = 0x1E02;
pub const DECR: u32 = 0x1E03;
pub const INVERT: u32 = 0x150A;
pub const INCR_WRAP: u32 = 0x8507;
pub const DECR_WRAP: u32 = 0x8508;

// Component types.
pub const BYTE: u32 = 0x1400;
pub const UNSIGNED_BYTE: u32 = 0x1401;
pub const SHORT: u32 = 0x1402;
pub const UNSIGNED_SHORT: u32 = 0x1403;
pub const INT: u32 = 0x1404;
pub const UNSIGNED_INT: u32 = 0x1405;
pub const FLOAT: u32 = 0x1406;
pub const DOUBLE: u32 = 0x140A;
pub const HALF_FLOAT: u32 = 0x140B;
pub const UNSIGNED_INT_8_8_8_8_REV: u32 = 0x8367;

// Texture filtering and addressing.
pub const NEAREST: u32 = 0x2600;
pub const LINEAR: u32 = 0x2601;
pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;
pub const CLAMP: u32 = 0x2900;
pub const REPEAT: u32 = 0x2901;
pub const CLAMP_TO_BORDER: u32 = 0x812D;
pub const CLAMP_TO_EDGE: u32 = 0x812F;
pub const MIRRORED_REPEAT: u32 = 0x8370;

// Texture parameters.
pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
pub const TEXTURE_WRAP_S: u32 = 0x2802;
pub const TEXTURE_WRAP_T: u32 = 0x2803;
pub const TEXTURE_WRAP_R: u32 = 0x8072;
pub const TEXTURE_MIN_LOD: u32 = 0x813A;
pub const TEXTURE_MAX_LOD: u32 = 0x813B;
pub const TEXTURE_BASE_LEVEL: u32 = 0x813C;
pub const TEXTURE_MAX_LEVEL: u32 = 0x813D;
pub const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;
pub const TEXTURE_LOD_BIAS: u32 = 0x8501;

// Texture targets.
pub const TEXTURE_1D: u32 = 0x0DE0;
pub const TEXTURE_2D: u32 = 0x0DE1;
pub const TEXTURE_3D: u32 = 0x806F;
pub const TEXTURE_RECTANGLE: u32 = 0x84F5;
pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
pub const TEXTURE_CUBE_MAP_POSITIVE_X: u32 = 0x8515;
pub const TEXTURE_CUBE_MAP_NEGATIVE_X: u32 = 0x8516;
pub const TEXTURE_CUBE_MAP_POSITIVE_Y: u32 = 0x8517;
pub const TEXTURE_CUBE_MAP_NEGATIVE_Y: u32 = 0x8518;
pub const TEXTURE_CUBE_MAP_POSITIVE_Z: u32 = 0x8519;
pub const TEXTURE_CUBE_MAP_NEGATIVE_Z: u32 = 0x851A;

// Pixel formats.
pub const DEPTH_COMPONENT: u32 = 0x1902;
pub const ALPHA: u32 = 0x1906;
pub const RGB: u32 = 0x1907;
pub const RGBA: u32 = 0x1908;
pub const LUMINANCE: u32 = 0x1909;
pub const LUMINANCE_ALPHA: u32 = 0x190A;
pub const ALPHA8: u32 = 0x803C;
pub const LUMINANCE8: u32 = 0x8040;
pub const LUMINANCE8_ALPHA8: u32 = 0x8045;
pub const INTENSITY: u32 = 0x8049;
pub const INTENSITY8: u32 = 0x804B;
pub const RGB8: u32 = 0x8051;
pub const RGBA8: u32 = 0x8058;
pub const BGR: u32 = 0x80E0;
pub const BGRA: u32 = 0x80E1;
pub const DEPTH_COMPONENT16: u32 = 0x81A5;
pub const DEPTH_COMPONENT24: u32 = 0x81A6;
pub const DEPTH_COMPONENT32: u32 = 0x81A7;
pub const COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;
pub const COMPRESSED_LUMINANCE_LATC1_EXT: u32 = 0x8C70;
pub const COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT: u32 = 0x8C71;
pub const COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT: u32 = 0x8C72;
pub const COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT: u32 = 0x8C73;

// Capabilities.
pub const POINT_SMOOTH: u32 = 0x0B10;
pub const LINE_SMOOTH: u32 = 0x0B20;
pub const POLYGON_SMOOTH: u32 = 0x0B41;
pub const CULL_FACE: u32 = 0x0B44;
pub const LIGHTING: u32 = 0x0B50;
pub const COLOR_MATERIAL: u32 = 0x0B57;
pub const FOG: u32 = 0x0B60;
pub const DEPTH_TEST: u32 = 0x0B71;
pub const STENCIL_TEST: u32 = 0x0B90;
pub const NORMALIZE: u32 = 0x0BA1;
pub const ALPHA_TEST: u32 = 0x0BC0;
pub const DITHER: u32 = 0x0BD0;
pub const BLEND: u32 = 0x0BE2;
pub const SCISSOR_TEST: u32 = 0x0C11;
pub const TEXTURE_GEN_S: u32 = 0x0C60;
pub const TEXTURE_GEN_T: u32 = 0x0C61;
pub const TEXTURE_GEN_R: u32 = 0x0C62;
pub const TEXTURE_GEN_Q: u32 = 0x0C63;
pub const POLYGON_OFFSET_FILL: u32 = 0x8037;
pub const RESCALE_NORMAL: u32 = 0x803A;
pub const MULTISAMPLE: u32 = 0x809D;
pub const LIGHT0: u32 = 0x4000;
pub const VERTEX_PROGRAM_ARB: u32 = 0x8620;
pub const FRAGMENT_PROGRAM_ARB: u32 = 0x8804;

// Client arrays.
pub const VERTEX_ARRAY: u32 = 0x8074;
pub const NORMAL_ARRAY: u32 = 0x8075;
pub const COLOR_ARRAY: u32 = 0x8076;
pub const INDEX_ARRAY: u32 = 0x8077;
pub const TEXTURE_COORD_ARRAY: u32 = 0x8078;
pub const EDGE_FLAG_ARRAY: u32 = 0x8079;
pub const C4F_N3F_V3F: u32 = 0x2A26;

// Lights and materials.
pub const AMBIENT: u32 = 0x1200;
pub const DIFFUSE: u32 = 0x1201;
pub const SPECULAR: u32 = 0x1202;
pub const POSITION: u32 = 0x1203;
pub const SPOT_DIRECTION: u32 = 0x1204;
pub const SPOT_EXPONENT: u32 = 0x1205;
pub const SPOT_CUTOFF: u32 = 0x1206;
pub const CONSTANT_ATTENUATION: u32 = 0x1207;
pub const LINEAR_ATTENUATION: u32 = 0x1208;
pub const QUADRATIC_ATTENUATION: u32 = 0x1209;
pub const EMISSION: u32 = 0x1600;
pub const SHININESS: u32 = 0x1601;
pub const AMBIENT_AND_DIFFUSE: u32 = 0x1602;
pub const COLOR_INDEXES: u32 = 0x1603;
pub const LIGHT_MODEL_LOCAL_VIEWER: u32 = 0x0B51;
pub const LIGHT_MODEL_TWO_SIDE: u32 = 0x0B52;
pub const LIGHT_MODEL_AMBIENT: u32 = 0x0B53;
pub const LIGHT_MODEL_COLOR_CONTROL: u32 = 0x81F8;
pub const SINGLE_COLOR: u32 = 0x81F9;
pub const SEPARATE_SPECULAR_COLOR: u32 = 0x81FA;

// Fog.
pub const EXP: u32 = 0x0800;
pub const EXP2: u32 = 0x0801;
pub const FOG_DENSITY: u32 = 0x0B62;
pub const FOG_START: u32 = 0x0B63;
pub const FOG_END: u32 = 0x0B64;
pub const FOG_MODE: u32 = 0x0B65;
pub const FOG_COLOR: u32 = 0x0B66;
pub const FOG_COORDINATE_SOURCE: u32 = 0x8450;
pub const FOG_COORDINATE: u32 = 0x8451;
pub const FRAGMENT_DEPTH: u32 = 0x8452;

// Matrices.
pub const MODELVIEW: u32 = 0x1700;
pub const PROJECTION: u32 = 0x1701;
pub const TEXTURE: u32 = 0x1702;
pub const MODELVIEW1_ARB: u32 = 0x850A;
pub const MODELVIEW2_ARB: u32 = 0x8722;
pub const MODELVIEW31_ARB: u32 = 0x873F;

// Texture units and environment.
pub const TEXTURE0: u32 = 0x84C0;
pub const ADD: u32 = 0x0104;
pub const MULT: u32 = 0x0103;
pub const MODULATE: u32 = 0x2100;
pub const DECAL: u32 = 0x2101;
pub const TEXTURE_ENV_MODE: u32 = 0x2200;
pub const TEXTURE_ENV_COLOR: u32 = 0x2201;
pub const TEXTURE_ENV: u32 = 0x2300;
pub const TEXTURE_FILTER_CONTROL: u32 = 0x8500;
pub const COMBINE4_NV: u32 = 0x8503;
pub const SUBTRACT: u32 = 0x84E7;
pub const COMBINE: u32 = 0x8570;
pub const COMBINE_RGB: u32 = 0x8571;
pub const COMBINE_ALPHA: u32 = 0x8572;
pub const RGB_SCALE: u32 = 0x8573;
pub const ADD_SIGNED: u32 = 0x8574;
pub const INTERPOLATE: u32 = 0x8575;
pub const CONSTANT: u32 = 0x8576;
pub const PRIMARY_COLOR: u32 = 0x8577;
pub const PREVIOUS: u32 = 0x8578;
pub const SOURCE0_RGB: u32 = 0x8580;
pub const SOURCE3_RGB_NV: u32 = 0x8583;
pub const SOURCE0_ALPHA: u32 = 0x8588;
pub const SOURCE3_ALPHA_NV: u32 = 0x858B;
pub const OPERAND0_RGB: u32 = 0x8590;
pub const OPERAND3_RGB_NV: u32 = 0x8593;
pub const OPERAND0_ALPHA: u32 = 0x8598;
pub const OPERAND3_ALPHA_NV: u32 = 0x859B;
pub const ALPHA_SCALE: u32 = 0x0D1C;
pub const DOT3_RGB: u32 = 0x86AE;
pub const DOT3_RGBA: u32 = 0x86AF;
pub const MODULATE_ADD_ATI: u32 = 0x8744;
pub const MODULATE_SIGNED_ADD_ATI: u32 = 0x8745;
pub const MODULATE_SUBTRACT_ATI: u32 = 0x8746;

// Texture coordinate generation.
pub const S: u32 = 0x2000;
pub const T: u32 = 0x2001;
pub const R: u32 = 0x2002;
pub const Q: u32 = 0x2003;
pub const EYE_LINEAR: u32 = 0x2400;
pub const OBJECT_LINEAR: u32 = 0x2401;
pub const SPHERE_MAP: u32 = 0x2402;
pub const TEXTURE_GEN_MODE: u32 = 0x2500;
pub const OBJECT_PLANE: u32 = 0x2501;
pub const EYE_PLANE: u32 = 0x2502;
pub const NORMAL_MAP: u32 = 0x8511;
pub const REFLECTION_MAP: u32 = 0x8512;

// Buffer objects.
pub const ARRAY_BUFFER: u32 = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

// Clear and attribute group bits.
pub const CURRENT_BIT: u32 = 0x0000_0001;
pub const POINT_BIT: u32 = 0x0000_0002;
pub const LINE_BIT: u32 = 0x0000_0004;
pub const POLYGON_BIT: u32 = 0x0000_0008;
pub const POLYGON_STIPPLE_BIT: u32 = 0x0000_0010;
pub const PIXEL_MODE_BIT: u32 = 0x0000_0020;
pub const LIGHTING_BIT: u32 = 0x0000_0040;
pub const FOG_BIT: u32 = 0x0000_0080;
pub const DEPTH_BUFFER_BIT: u32 = 0x0000_0100;
pub const ACCUM_BUFFER_BIT: u32 = 0x0000_0200;
pub const STENCIL_BUFFER_BIT: u32 = 0x0000_0400;
pub const VIEWPORT_BIT: u32 = 0x0000_0800;
pub const TRANSFORM_BIT: u32 = 0x0000_1000;
pub const ENABLE_BIT: u32 = 0x0000_2000;
pub const COLOR_BUFFER_BIT: u32 = 0x0000_4000;
pub const HINT_BIT: u32 = 0x0000_8000;
pub const EVAL_BIT: u32 = 0x0001_0000;
pub const LIST_BIT: u32 = 0x0002_0000;
pub const TEXTURE_BIT: u32 = 0x0004_0000;
pub const SCISSOR_BIT: u32 = 0x0008_0000;
pub const MULTISAMPLE_BIT: u32 = 0x2000_0000;
pub const ALL_ATTRIB_BITS: u32 = 0xFFFF_FFFF;

// Programs.
pub const PROGRAM_FORMAT_ASCII_ARB: u32 = 0x8875;

// Strings.
pub const VENDOR: u32 = 0x1F00;
pub const RENDERER: u32 = 0x1F01;
pub const VERSION: u32 = 0x1F02;
pub const EXTENSIONS: u32 = 0x1F03;
