//! # TCP Arm Driver Module
//!
//! Newline-delimited JSON client for the arm controllers. One TCP
//! connection per arm; every command is a single JSON object on its own
//! line. Jog and gripper commands are write-only, `move_to_pose` waits for
//! a one-line `{"ok": bool}` reply from the controller.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use async_trait::async_trait;

use crate::driver::{ArmDriver, MoveOutcome};
use crate::error::{Result, TeleopError};

/// Wire format of a command line.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Command {
    JogCartesian { dx: f64, dy: f64, dz: f64, speed: f64 },
    JogOrientation { droll: f64, dpitch: f64, dyaw: f64, speed: f64 },
    StopMotion,
    MoveToPose { rpy: [f64; 3], speed: f64 },
    SetGripper { gripper_id: u8, open: bool, speed: u32, force: u32 },
}

/// Wire format of a `move_to_pose` reply line.
#[derive(Debug, Deserialize)]
struct MoveReply {
    ok: bool,
}

struct Io {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// One arm controller connection.
///
/// Commands from concurrent tasks are serialized over the connection by an
/// internal lock, so a `move_to_pose` in flight delays (but never corrupts)
/// tick-loop jogs to the same arm.
pub struct TcpArmDriver {
    label: String,
    io: Mutex<Io>,
}

impl TcpArmDriver {
    /// Connects to an arm controller.
    ///
    /// `label` names the arm in log lines (e.g. "left").
    ///
    /// # Errors
    ///
    /// Returns `Driver` if the TCP connection cannot be established.
    pub async fn connect(label: &str, ip: &str, port: u16) -> Result<Self> {
        info!("Connecting to {} arm at {}:{}", label, ip, port);

        let stream = TcpStream::connect((ip, port)).await.map_err(|e| {
            TeleopError::Driver(format!("{} arm at {}:{}: {}", label, ip, port, e))
        })?;
        stream
            .set_nodelay(true)
            .map_err(|e| TeleopError::Driver(format!("{} arm set_nodelay: {}", label, e)))?;

        let (read_half, write_half) = stream.into_split();
        info!("Connected to {} arm", label);

        Ok(Self {
            label: label.to_string(),
            io: Mutex::new(Io {
                reader: BufReader::new(read_half),
                writer: write_half,
            }),
        })
    }

    /// Serializes `command` and writes it as one line.
    async fn send(&self, io: &mut Io, command: &Command) -> Result<()> {
        let mut line = serde_json::to_string(command)
            .map_err(|e| TeleopError::Driver(format!("{} arm encode: {}", self.label, e)))?;
        line.push('\n');

        debug!("{} arm <- {}", self.label, line.trim_end());

        io.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TeleopError::Driver(format!("{} arm write: {}", self.label, e)))?;
        io.writer
            .flush()
            .await
            .map_err(|e| TeleopError::Driver(format!("{} arm flush: {}", self.label, e)))?;
        Ok(())
    }

    /// Sends a write-only command.
    async fn send_command(&self, command: Command) -> Result<()> {
        let mut io = self.io.lock().await;
        self.send(&mut io, &command).await
    }
}

#[async_trait]
impl ArmDriver for TcpArmDriver {
    async fn jog_cartesian(&self, dx: f64, dy: f64, dz: f64, speed: f64) -> Result<()> {
        self.send_command(Command::JogCartesian { dx, dy, dz, speed }).await
    }

    async fn jog_orientation(&self, droll: f64, dpitch: f64, dyaw: f64, speed: f64) -> Result<()> {
        self.send_command(Command::JogOrientation {
            droll,
            dpitch,
            dyaw,
            speed,
        })
        .await
    }

    async fn stop_motion(&self) -> Result<()> {
        self.send_command(Command::StopMotion).await
    }

    async fn move_to_pose(&self, rpy: [f64; 3], speed: f64) -> Result<MoveOutcome> {
        let mut io = self.io.lock().await;
        self.send(&mut io, &Command::MoveToPose { rpy, speed }).await?;

        let mut line = String::new();
        let read = io
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| TeleopError::Driver(format!("{} arm read: {}", self.label, e)))?;
        if read == 0 {
            return Err(TeleopError::Driver(format!(
                "{} arm closed the connection",
                self.label
            )));
        }

        let reply: MoveReply = serde_json::from_str(line.trim_end())
            .map_err(|e| TeleopError::Driver(format!("{} arm reply: {}", self.label, e)))?;

        Ok(if reply.ok {
            MoveOutcome::Success
        } else {
            MoveOutcome::Fail
        })
    }

    async fn set_gripper(&self, gripper_id: u8, open: bool, speed: u32, force: u32) -> Result<()> {
        self.send_command(Command::SetGripper {
            gripper_id,
            open,
            speed,
            force,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    // ==================== Wire Format Tests ====================

    #[test]
    fn test_jog_cartesian_wire_format() {
        let command = Command::JogCartesian {
            dx: 1.0,
            dy: 0.0,
            dz: 0.0,
            speed: 40.0,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"cmd":"jog_cartesian","dx":1.0,"dy":0.0,"dz":0.0,"speed":40.0}"#
        );
    }

    #[test]
    fn test_stop_motion_wire_format() {
        let json = serde_json::to_string(&Command::StopMotion).unwrap();
        assert_eq!(json, r#"{"cmd":"stop_motion"}"#);
    }

    #[test]
    fn test_move_to_pose_wire_format() {
        let command = Command::MoveToPose {
            rpy: [180.0, 0.0, 180.0],
            speed: 50.0,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"cmd":"move_to_pose","rpy":[180.0,0.0,180.0],"speed":50.0}"#
        );
    }

    #[test]
    fn test_set_gripper_wire_format() {
        let command = Command::SetGripper {
            gripper_id: 9,
            open: true,
            speed: 150,
            force: 100,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"cmd":"set_gripper","gripper_id":9,"open":true,"speed":150,"force":100}"#
        );
    }

    #[test]
    fn test_move_reply_parses() {
        let reply: MoveReply = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(reply.ok);
        let reply: MoveReply = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(!reply.ok);
    }

    // ==================== Loopback Tests ====================

    #[tokio::test]
    async fn test_connect_and_jog_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            line
        });

        let driver = TcpArmDriver::connect("left", "127.0.0.1", addr.port())
            .await
            .unwrap();
        driver.jog_cartesian(0.0, -1.0, 0.0, 40.0).await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(
            received.trim_end(),
            r#"{"cmd":"jog_cartesian","dx":0.0,"dy":-1.0,"dz":0.0,"speed":40.0}"#
        );
    }

    #[tokio::test]
    async fn test_move_to_pose_reads_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            write_half.write_all(b"{\"ok\":false}\n").await.unwrap();
        });

        let driver = TcpArmDriver::connect("right", "127.0.0.1", addr.port())
            .await
            .unwrap();
        let outcome = driver
            .move_to_pose([180.0, 0.0, 0.0], 50.0)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Fail);
    }

    #[tokio::test]
    async fn test_connect_failure_is_a_driver_error() {
        // Port 1 on localhost is almost certainly closed
        let result = TcpArmDriver::connect("left", "127.0.0.1", 1).await;
        assert!(matches!(result, Err(TeleopError::Driver(_))));
    }
}
