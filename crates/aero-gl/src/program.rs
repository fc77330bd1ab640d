//! User programs in the assembly dialect and their constant-register banks.
//!
//! A program object only stores text; compiling it against the current
//! environment and local banks is delegated to a [`ProgramCompiler`] at draw
//! time.

use hashbrown::HashMap;
use tracing::debug;

use crate::device::{ShaderCode, ShaderLanguage, ShaderStage};
use crate::error::{GlError, Result};
use crate::gl;
use crate::objects::texture::TextureTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramTarget {
    Vertex,
    Fragment,
}

impl ProgramTarget {
    pub fn from_gl(call: &'static str, value: u32) -> Result<Self> {
        match value {
            gl::VERTEX_PROGRAM_ARB => Ok(ProgramTarget::Vertex),
            gl::FRAGMENT_PROGRAM_ARB => Ok(ProgramTarget::Fragment),
            other => Err(GlError::unsupported(call, "program target", other)),
        }
    }

    fn index(self) -> usize {
        match self {
            ProgramTarget::Vertex => 0,
            ProgramTarget::Fragment => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProgramTarget::Vertex => "vertex",
            ProgramTarget::Fragment => "fragment",
        }
    }

    pub fn stage(self) -> ShaderStage {
        match self {
            ProgramTarget::Vertex => ShaderStage::Vertex,
            ProgramTarget::Fragment => ShaderStage::Fragment,
        }
    }

    fn header(self) -> &'static str {
        match self {
            ProgramTarget::Vertex => "!!ARBvp1.0",
            ProgramTarget::Fragment => "!!ARBfp1.0",
        }
    }
}

/// Fixed-size bank of four-component constant registers.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterBank {
    registers: Vec<[f32; 4]>,
}

impl RegisterBank {
    pub fn new(size: u32) -> Self {
        Self {
            registers: vec![[0.0; 4]; size as usize],
        }
    }

    pub fn get(&self, index: u32) -> Option<[f32; 4]> {
        self.registers.get(index as usize).copied()
    }

    pub fn set(&mut self, call: &'static str, index: u32, value: [f32; 4]) -> Result<()> {
        self.set_many(call, index, &[value])
    }

    /// Writes consecutive registers starting at `index`; nothing is written
    /// when the range does not fit.
    pub fn set_many(&mut self, call: &'static str, index: u32, values: &[[f32; 4]]) -> Result<()> {
        let limit = self.registers.len() as u32;
        let end = index as usize + values.len();
        if end > self.registers.len() {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "program parameter",
                index: end.saturating_sub(1) as u32,
                limit,
            });
        }
        self.registers[index as usize..end].copy_from_slice(values);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.registers)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgramObject {
    pub name: u32,
    pub target: Option<ProgramTarget>,
    pub source: Option<String>,
    pub locals: RegisterBank,
}

impl ProgramObject {
    fn new(name: u32, target: Option<ProgramTarget>, parameters: u32) -> Self {
        Self {
            name,
            target,
            source: None,
            locals: RegisterBank::new(parameters),
        }
    }
}

/// Program text plus the banks it is compiled against.
#[derive(Clone, Copy, Debug)]
pub struct ProgramSource<'a> {
    pub target: ProgramTarget,
    pub name: u32,
    pub text: &'a str,
    pub env: &'a RegisterBank,
    pub locals: &'a RegisterBank,
}

/// A compiled user program and the texture units it samples.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledProgram {
    pub code: ShaderCode,
    pub texture_units: Vec<(u32, TextureTarget)>,
}

/// Turns assembly-dialect text into device code.
pub trait ProgramCompiler {
    fn compile(&self, call: &'static str, source: &ProgramSource<'_>) -> Result<CompiledProgram>;
}

/// Hands the program text to the device unchanged, with the environment
/// bank followed by the local bank as its uniform block.
///
/// Only the envelope is checked: the header matching the target, a closing
/// `END`, and the `texture[n], TARGET` references used to bind samplers.
#[derive(Clone, Copy, Debug)]
pub struct AssemblyPassthrough {
    pub texture_units: u32,
}

impl ProgramCompiler for AssemblyPassthrough {
    fn compile(&self, call: &'static str, source: &ProgramSource<'_>) -> Result<CompiledProgram> {
        let text = source.text.trim();
        if !text.starts_with(source.target.header()) {
            return Err(GlError::ProgramCompile {
                call,
                message: format!("missing {} header", source.target.header()),
            });
        }
        if !text.ends_with("END") {
            return Err(GlError::ProgramCompile {
                call,
                message: "missing END".to_owned(),
            });
        }
        let texture_units = match source.target {
            ProgramTarget::Vertex => Vec::new(),
            ProgramTarget::Fragment => texture_references(call, text, self.texture_units)?,
        };
        let mut uniforms = source.env.as_bytes().to_vec();
        uniforms.extend_from_slice(source.locals.as_bytes());
        Ok(CompiledProgram {
            code: ShaderCode {
                stage: source.target.stage(),
                language: ShaderLanguage::ArbAssembly,
                source: source.text.to_owned(),
                entry_point: "main".to_owned(),
                uniforms,
            },
            texture_units,
        })
    }
}

/// Collects `texture[n], TARGET` operands, one entry per unit.
fn texture_references(call: &'static str, text: &str, units: u32) -> Result<Vec<(u32, TextureTarget)>> {
    let mut out: Vec<(u32, TextureTarget)> = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("texture[") {
        rest = &rest[pos + "texture[".len()..];
        let close = rest.find(']').ok_or_else(|| GlError::ProgramCompile {
            call,
            message: "unterminated texture reference".to_owned(),
        })?;
        let unit: u32 = rest[..close].trim().parse().map_err(|_| GlError::ProgramCompile {
            call,
            message: format!("bad texture unit `{}`", &rest[..close]),
        })?;
        rest = &rest[close + 1..];
        let operand = rest.trim_start().trim_start_matches(',').trim_start();
        let word: String = operand.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
        let target = match word.as_str() {
            "1D" => TextureTarget::Texture1D,
            "2D" => TextureTarget::Texture2D,
            "3D" => TextureTarget::Texture3D,
            "CUBE" => TextureTarget::CubeMap,
            "RECT" => TextureTarget::Rectangle,
            other => {
                return Err(GlError::ProgramCompile {
                    call,
                    message: format!("unknown texture target `{other}` for unit {unit}"),
                })
            }
        };
        if unit >= units {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "texture unit",
                index: unit,
                limit: units,
            });
        }
        if !out.iter().any(|(u, _)| *u == unit) {
            out.push((unit, target));
        }
    }
    out.sort_by_key(|(unit, _)| *unit);
    Ok(out)
}

/// Program objects, bindings and per-target environment banks.
#[derive(Debug)]
pub struct ProgramManager {
    objects: HashMap<u32, ProgramObject>,
    defaults: [ProgramObject; 2],
    bound: [u32; 2],
    env: [RegisterBank; 2],
    parameters: u32,
}

impl ProgramManager {
    pub fn new(parameters: u32) -> Self {
        Self {
            objects: HashMap::new(),
            defaults: [
                ProgramObject::new(0, Some(ProgramTarget::Vertex), parameters),
                ProgramObject::new(0, Some(ProgramTarget::Fragment), parameters),
            ],
            bound: [0; 2],
            env: [RegisterBank::new(parameters), RegisterBank::new(parameters)],
            parameters,
        }
    }

    pub fn generate(&mut self, names: &[u32]) {
        for &name in names {
            if name != 0 {
                let parameters = self.parameters;
                self.objects
                    .entry(name)
                    .or_insert_with(|| ProgramObject::new(name, None, parameters));
            }
        }
    }

    pub fn bind(&mut self, call: &'static str, target: ProgramTarget, name: u32) -> Result<()> {
        if name != 0 {
            let parameters = self.parameters;
            let object = self
                .objects
                .entry(name)
                .or_insert_with(|| ProgramObject::new(name, None, parameters));
            match object.target {
                None => object.target = Some(target),
                Some(existing) if existing == target => {}
                Some(_) => {
                    return Err(GlError::UnsupportedEnum {
                        call,
                        param: "program target for an object bound elsewhere",
                        value: name,
                    })
                }
            }
        }
        self.bound[target.index()] = name;
        Ok(())
    }

    /// Deleting a bound program reverts the target to program 0.
    pub fn delete(&mut self, names: &[u32]) {
        for &name in names {
            if name == 0 {
                continue;
            }
            self.objects.remove(&name);
            for bound in &mut self.bound {
                if *bound == name {
                    *bound = 0;
                }
            }
        }
    }

    pub fn bound(&self, target: ProgramTarget) -> u32 {
        self.bound[target.index()]
    }

    pub fn current(&self, target: ProgramTarget) -> &ProgramObject {
        let name = self.bound(target);
        self.objects
            .get(&name)
            .unwrap_or(&self.defaults[target.index()])
    }

    fn current_mut(&mut self, target: ProgramTarget) -> &mut ProgramObject {
        let name = self.bound(target);
        match self.objects.get_mut(&name) {
            Some(object) => object,
            None => &mut self.defaults[target.index()],
        }
    }

    pub fn program_string(
        &mut self,
        call: &'static str,
        target: ProgramTarget,
        format: u32,
        text: &str,
    ) -> Result<()> {
        if format != gl::PROGRAM_FORMAT_ASCII_ARB {
            return Err(GlError::unsupported(call, "program format", format));
        }
        let object = self.current_mut(target);
        debug!(program = object.name, target = target.name(), len = text.len(), "program string");
        object.source = Some(text.to_owned());
        Ok(())
    }

    pub fn env_mut(&mut self, target: ProgramTarget) -> &mut RegisterBank {
        &mut self.env[target.index()]
    }

    pub fn env(&self, target: ProgramTarget) -> &RegisterBank {
        &self.env[target.index()]
    }

    pub fn locals_mut(&mut self, target: ProgramTarget) -> &mut RegisterBank {
        &mut self.current_mut(target).locals
    }

    /// Compiles the program bound to `target` against the current banks.
    pub fn compile(
        &self,
        compiler: &dyn ProgramCompiler,
        call: &'static str,
        target: ProgramTarget,
    ) -> Result<CompiledProgram> {
        let object = self.current(target);
        let text = object.source.as_deref().ok_or(GlError::EmptyProgram {
            call,
            target: target.name(),
            name: object.name,
        })?;
        compiler.compile(
            call,
            &ProgramSource {
                target,
                name: object.name,
                text,
                env: self.env(target),
                locals: &object.locals,
            },
        )
    }
}
